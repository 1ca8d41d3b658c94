//! JSON Web Key Set document and the verifier-side key cache.
//!
//! ## Cache model
//!
//! The cache is an immutable [`KeySnapshot`] behind an `RwLock<Arc<_>>`.
//! Readers clone the `Arc` and never block on I/O; a refresh builds a complete
//! new snapshot and swaps the pointer, so a cancelled fetch can never leave a
//! half-written map behind.
//!
//! Refreshes are single-flight: a miss takes the refresh lock, and if another
//! task made an attempt while we were waiting we take its outcome instead of
//! fetching again. A new snapshot is served from; a failed attempt is handed
//! back as the same `KeyFetchFailed`, so an issuer outage costs one fetch
//! (plus its retry) per wave of callers rather than one per caller.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::DecodingKey;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::JwksError;

/// Well-known path the issuing service serves its key set on.
pub const JWKS_PATH: &str = "/.well-known/jwks.json";

const DEFAULT_REFRESH_COOLDOWN: Duration = Duration::from_secs(10);
const MAX_FETCH_ATTEMPTS: u32 = 2;

/// Single JWKS entry (RFC 7517 subset for RSA signing keys).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    pub kid: String,
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub use_: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    /// RSA modulus, base64url
    pub n: String,
    /// RSA public exponent, base64url
    pub e: String,
}

impl Jwk {
    pub fn rsa(kid: String, n: String, e: String) -> Self {
        Self {
            kty: "RSA".to_string(),
            kid,
            use_: Some("sig".to_string()),
            alg: Some("RS256".to_string()),
            n,
            e,
        }
    }

    /// Whether this entry can verify RS256 signatures. Entries without `alg`
    /// are accepted as long as they are RSA keys.
    fn is_rs256_signing_key(&self) -> bool {
        self.kty == "RSA"
            && self.alg.as_deref().map_or(true, |alg| alg == "RS256")
            && self.use_.as_deref().map_or(true, |u| u == "sig")
    }
}

/// `{ "keys": [...] }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwksDocument {
    pub keys: Vec<Jwk>,
}

/// Where the verifier gets its key set from.
#[async_trait]
pub trait JwksSource: Send + Sync {
    async fn fetch(&self) -> Result<JwksDocument, JwksError>;

    /// Human readable origin, for logs.
    fn describe(&self) -> String;
}

/// Fetches the key set from the issuer's discovery endpoint.
pub struct HttpJwksSource {
    url: String,
    client: reqwest::Client,
}

impl HttpJwksSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, JwksError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| JwksError::KeyFetchFailed(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl JwksSource for HttpJwksSource {
    async fn fetch(&self) -> Result<JwksDocument, JwksError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| JwksError::KeyFetchFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(JwksError::KeyFetchFailed(format!(
                "key set endpoint answered {status}"
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| JwksError::KeyFetchFailed(e.to_string()))?;

        serde_json::from_slice(&body).map_err(|e| JwksError::MalformedKeySet(e.to_string()))
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Immutable view of the resolved keys.
struct KeySnapshot {
    generation: u64,
    fetched_at: Option<Instant>,
    keys: HashMap<String, DecodingKey>,
}

impl KeySnapshot {
    fn empty() -> Self {
        Self {
            generation: 0,
            fetched_at: None,
            keys: HashMap::new(),
        }
    }
}

/// Outcome of the most recent refresh, guarded by the refresh lock.
#[derive(Default)]
struct RefreshState {
    last_failure: Option<JwksError>,
}

/// Resolves verification keys by `kid`, fetching the key set on a miss.
pub struct JwksClient {
    source: Arc<dyn JwksSource>,
    snapshot: RwLock<Arc<KeySnapshot>>,
    refresh: Mutex<RefreshState>,
    /// Bumped when a refresh attempt finishes, successful or not.
    attempts: AtomicU64,
    refresh_cooldown: Duration,
}

impl JwksClient {
    pub fn new(source: Arc<dyn JwksSource>) -> Self {
        Self {
            source,
            snapshot: RwLock::new(Arc::new(KeySnapshot::empty())),
            refresh: Mutex::new(RefreshState::default()),
            attempts: AtomicU64::new(0),
            refresh_cooldown: DEFAULT_REFRESH_COOLDOWN,
        }
    }

    /// Minimum delay between two refreshes triggered by unknown `kid`s.
    pub fn with_refresh_cooldown(mut self, cooldown: Duration) -> Self {
        self.refresh_cooldown = cooldown;
        self
    }

    /// Number of keys currently cached.
    pub fn cached_key_count(&self) -> usize {
        self.current().keys.len()
    }

    pub async fn resolve_key(&self, kid: &str) -> Result<DecodingKey, JwksError> {
        let observed = self.current();
        if let Some(key) = observed.keys.get(kid) {
            return Ok(key.clone());
        }

        let observed_attempt = self.attempts.load(Ordering::Acquire);
        let mut state = self.refresh.lock().await;

        // Someone else refreshed while we waited for the lock; their fetch
        // counts as ours.
        let latest = self.current();
        if latest.generation != observed.generation {
            return latest
                .keys
                .get(kid)
                .cloned()
                .ok_or_else(|| JwksError::KeyNotFound(kid.to_string()));
        }

        // Someone else tried and failed while we waited; so do we.
        if self.attempts.load(Ordering::Acquire) != observed_attempt {
            if let Some(err) = &state.last_failure {
                debug!(kid, error = %err, "sharing failed key set refresh");
                return Err(err.clone());
            }
        }

        if let Some(fetched_at) = latest.fetched_at {
            if fetched_at.elapsed() < self.refresh_cooldown {
                debug!(kid, "unknown kid within refresh cool-down, not refetching");
                return Err(JwksError::KeyNotFound(kid.to_string()));
            }
        }

        // The counter moves only once an attempt has an outcome, so a
        // cancelled fetch leaves waiters free to try themselves.
        let outcome = self.fetch_with_retry().await;
        state.last_failure = outcome.as_ref().err().cloned();
        self.attempts.fetch_add(1, Ordering::AcqRel);

        let document = outcome?;
        let refreshed = self.install(latest.generation + 1, &document);

        refreshed
            .keys
            .get(kid)
            .cloned()
            .ok_or_else(|| JwksError::KeyNotFound(kid.to_string()))
    }

    fn current(&self) -> Arc<KeySnapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn fetch_with_retry(&self) -> Result<JwksDocument, JwksError> {
        let mut attempt = 1;
        loop {
            match self.source.fetch().await {
                Ok(document) => return Ok(document),
                // A body we cannot parse will not parse on a second try either.
                Err(err @ JwksError::MalformedKeySet(_)) => {
                    warn!(source = %self.source.describe(), error = %err, "key set is malformed");
                    return Err(err);
                }
                Err(err) if attempt < MAX_FETCH_ATTEMPTS => {
                    warn!(
                        source = %self.source.describe(),
                        attempt,
                        error = %err,
                        "key set fetch failed, retrying"
                    );
                    attempt += 1;
                }
                Err(err) => {
                    warn!(source = %self.source.describe(), attempt, error = %err, "key set fetch failed");
                    return Err(err);
                }
            }
        }
    }

    fn install(&self, generation: u64, document: &JwksDocument) -> Arc<KeySnapshot> {
        let mut keys = HashMap::with_capacity(document.keys.len());
        for jwk in &document.keys {
            if !jwk.is_rs256_signing_key() {
                warn!(kid = %jwk.kid, kty = %jwk.kty, alg = ?jwk.alg, "skipping non-RS256 key");
                continue;
            }
            match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
                Ok(key) => {
                    keys.insert(jwk.kid.clone(), key);
                }
                Err(e) => warn!(kid = %jwk.kid, error = %e, "skipping unusable key"),
            }
        }

        info!(
            source = %self.source.describe(),
            keys = keys.len(),
            generation,
            "key set refreshed"
        );

        let snapshot = Arc::new(KeySnapshot {
            generation,
            fetched_at: Some(Instant::now()),
            keys,
        });
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = snapshot.clone();
        snapshot
    }
}
