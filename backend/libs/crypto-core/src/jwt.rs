/// Identity tokens for the campus services.
///
/// This module provides RS256 (RSA with SHA-256) token issuance and
/// verification. The auth service owns a [`KeyStore`] and mints tokens with
/// [`TokenIssuer`]; every other service verifies them with [`TokenVerifier`],
/// which resolves public keys through a [`JwksClient`] and never sees the
/// private key.
///
/// ## Security Design
///
/// - **RS256 ONLY**: the header algorithm is checked before any key lookup;
///   `none` and HMAC algorithms are rejected outright
/// - **kid required**: a token must name the key it was signed with
/// - **Fail-closed**: every failure is an error, there is no unsigned path
/// - **Expiry**: enforced whenever `exp` is present; issuance sets it only
///   when a TTL is configured
///
/// ## Usage
///
/// ```rust,no_run
/// use crypto_core::jwks::{HttpJwksSource, JwksClient};
/// use crypto_core::jwt::{Role, RoleSet, TokenVerifier};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # async fn demo(token: &str) -> Result<(), Box<dyn std::error::Error>> {
/// let source = HttpJwksSource::new("http://localhost:5001/.well-known/jwks.json", Duration::from_secs(5))?;
/// let verifier = TokenVerifier::new(Arc::new(JwksClient::new(Arc::new(source))));
///
/// let principal = verifier.verify(token).await?;
/// assert!(principal.roles.intersects(&RoleSet::from([Role::Professor, Role::Admin])));
/// # Ok(())
/// # }
/// ```
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{TokenError, VerifyError};
use crate::jwks::JwksClient;
use crate::keys::KeyStore;

// ============================================================================
// Constants
// ============================================================================

/// The only algorithm tokens are signed or accepted with.
pub const JWT_ALGORITHM: Algorithm = Algorithm::RS256;

const JWT_ALGORITHM_NAME: &str = "RS256";

/// Clock skew tolerated when checking `exp`.
pub const DEFAULT_LEEWAY_SECS: u64 = 30;

// ============================================================================
// Roles
// ============================================================================

/// Closed set of roles a principal can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Student,
    Professor,
    Admin,
    AuthService,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "STUDENT",
            Role::Professor => "PROFESSOR",
            Role::Admin => "ADMIN",
            Role::AuthService => "AUTH_SERVICE",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of roles. Authorization is always intersection, never equality.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    pub fn intersects(&self, other: &RoleSet) -> bool {
        self.0.intersection(&other.0).next().is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<const N: usize> From<[Role; N]> for RoleSet {
    fn from(roles: [Role; N]) -> Self {
        RoleSet(roles.into_iter().collect())
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(Role::as_str).collect();
        write!(f, "[{}]", names.join(","))
    }
}

// ============================================================================
// Data Structures
// ============================================================================

/// Token body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject id (student or professor number)
    pub id: i64,
    /// Roles granted to the subject; a missing claim decodes as empty and is
    /// rejected by the verifier
    #[serde(default)]
    pub roles: RoleSet,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp), only present when a TTL is configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// Verified identity attached to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: i64,
    pub roles: RoleSet,
}

impl Principal {
    pub fn has_any_role(&self, roles: &RoleSet) -> bool {
        self.roles.intersects(roles)
    }

    pub fn is_owner(&self, resource_owner_id: i64) -> bool {
        self.id == resource_owner_id
    }
}

// ============================================================================
// Token Generation
// ============================================================================

/// Mints signed tokens with the service's [`KeyStore`].
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    keys: Arc<KeyStore>,
    ttl: Option<Duration>,
}

impl TokenIssuer {
    /// Issuer that sets no `exp` claim.
    pub fn new(keys: Arc<KeyStore>) -> Self {
        Self { keys, ttl: None }
    }

    /// Set (or clear) the lifetime stamped into issued tokens.
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    pub fn key_store(&self) -> &KeyStore {
        &self.keys
    }

    pub fn issue(&self, subject_id: i64, roles: RoleSet) -> Result<String, TokenError> {
        self.issue_at(subject_id, roles, Utc::now())
    }

    /// Issue with an explicit lifetime regardless of the configured TTL.
    pub fn issue_with_ttl(
        &self,
        subject_id: i64,
        roles: RoleSet,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        self.build(subject_id, roles, Utc::now(), Some(ttl))
    }

    /// Deterministic form of [`TokenIssuer::issue`]: identical inputs give an
    /// identical token.
    pub fn issue_at(
        &self,
        subject_id: i64,
        roles: RoleSet,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        self.build(subject_id, roles, issued_at, self.ttl)
    }

    fn build(
        &self,
        subject_id: i64,
        roles: RoleSet,
        issued_at: DateTime<Utc>,
        ttl: Option<Duration>,
    ) -> Result<String, TokenError> {
        if roles.is_empty() {
            return Err(TokenError::EmptyRoles);
        }

        let iat = issued_at.timestamp();
        let exp = ttl.map(|ttl| iat + ttl.as_secs() as i64);
        let claims = Claims {
            id: subject_id,
            roles,
            iat,
            exp,
        };

        let mut header = Header::new(JWT_ALGORITHM);
        header.kid = Some(self.keys.kid().to_string());

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?),
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?)
        );
        let signature = self.keys.sign(signing_input.as_bytes())?;

        debug!(subject_id, roles = %claims.roles, kid = %signature.kid, "token issued");
        Ok(format!("{signing_input}.{}", signature.value))
    }
}

// ============================================================================
// Token Validation
// ============================================================================

/// Header fields read before the signature is checked. `alg` is kept as a raw
/// string so `none` and unknown algorithms are reported as such instead of as
/// parse failures.
#[derive(Debug, Deserialize)]
struct UnverifiedHeader {
    alg: String,
    #[serde(default)]
    kid: Option<String>,
}

/// Verifies presented tokens against keys resolved from the issuer's JWKS.
pub struct TokenVerifier {
    jwks: Arc<JwksClient>,
    leeway_secs: u64,
    require_expiry: bool,
}

impl TokenVerifier {
    pub fn new(jwks: Arc<JwksClient>) -> Self {
        Self {
            jwks,
            leeway_secs: DEFAULT_LEEWAY_SECS,
            require_expiry: false,
        }
    }

    pub fn with_leeway(mut self, leeway_secs: u64) -> Self {
        self.leeway_secs = leeway_secs;
        self
    }

    /// Reject tokens that carry no `exp` claim.
    pub fn require_expiry(mut self, required: bool) -> Self {
        self.require_expiry = required;
        self
    }

    pub fn jwks(&self) -> &JwksClient {
        &self.jwks
    }

    /// Validate `token` (without the `Bearer ` prefix) and return the
    /// principal it names.
    ///
    /// ## Errors
    ///
    /// Any malformed segment, non-RS256 algorithm, missing or unknown `kid`,
    /// signature mismatch, expired token or missing `roles` claim.
    pub async fn verify(&self, token: &str) -> Result<Principal, VerifyError> {
        let header = decode_unverified_header(token)?;

        if header.alg != JWT_ALGORITHM_NAME {
            return Err(VerifyError::DisallowedAlgorithm(header.alg));
        }

        let kid = header
            .kid
            .filter(|kid| !kid.is_empty())
            .ok_or(VerifyError::MissingKeyId)?;

        let key = self.jwks.resolve_key(&kid).await?;

        let data = jsonwebtoken::decode::<Claims>(token, &key, &self.validation())?;
        let claims = data.claims;

        if claims.roles.is_empty() {
            return Err(VerifyError::MissingRoles);
        }

        Ok(Principal {
            id: claims.id,
            roles: claims.roles,
        })
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.leeway = self.leeway_secs;
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.required_spec_claims = if self.require_expiry {
            HashSet::from(["exp".to_string()])
        } else {
            HashSet::new()
        };
        validation
    }
}

fn decode_unverified_header(token: &str) -> Result<UnverifiedHeader, VerifyError> {
    let mut segments = token.split('.');
    let (Some(header), Some(_), Some(_), None) =
        (segments.next(), segments.next(), segments.next(), segments.next())
    else {
        return Err(VerifyError::Malformed("expected three segments".to_string()));
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|e| VerifyError::Malformed(format!("header is not base64url: {e}")))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| VerifyError::Malformed(format!("header is not valid JSON: {e}")))
}

// ============================================================================
// Tests
// ============================================================================
