/// Configuration management
///
/// Loaded from the environment with `envy` (after `dotenv` has read `.env`).
/// Every field maps to the upper-case variable of the same name, e.g.
/// `jwt_private_key_path` <- `JWT_PRIVATE_KEY_PATH`.
use std::time::Duration;

use actix_middleware::{LogFormat, RateLimitConfig};
use crypto_core::{KeyError, KeyStore};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    /// Inline PEM; literal `\n` sequences are accepted for single-line env files
    pub jwt_private_key_pem: Option<String>,
    pub jwt_private_key_path: Option<String>,
    /// Overrides the JWK thumbprint as `kid`
    pub jwt_key_id: Option<String>,

    /// Lifetime of login tokens; unset means tokens carry no `exp`
    pub token_ttl_secs: Option<u64>,
    #[serde(default = "default_service_token_ttl_secs")]
    pub service_token_ttl_secs: u64,

    #[serde(default = "default_login_rate_limit")]
    pub login_rate_limit_per_minute: u32,
    #[serde(default)]
    pub trust_forwarded_for: bool,

    #[serde(default = "default_student_service_url")]
    pub student_service_url: String,
    #[serde(default = "default_professor_service_url")]
    pub professor_service_url: String,
    #[serde(default = "default_outbound_timeout_ms")]
    pub outbound_timeout_ms: u64,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5001
}

fn default_service_token_ttl_secs() -> u64 {
    60
}

fn default_login_rate_limit() -> u32 {
    10
}

fn default_student_service_url() -> String {
    "http://localhost:5003".to_string()
}

fn default_professor_service_url() -> String {
    "http://localhost:5002".to_string()
}

fn default_outbound_timeout_ms() -> u64 {
    5000
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    /// Load the signing key. There is no fallback: without a key the service
    /// must not start.
    pub fn load_key_store(&self) -> Result<KeyStore, KeyError> {
        let kid = self.jwt_key_id.clone();
        match (&self.jwt_private_key_pem, &self.jwt_private_key_path) {
            (Some(pem), _) if !pem.trim().is_empty() => {
                KeyStore::from_pem(&pem.replace("\\n", "\n"), kid)
            }
            (_, Some(path)) if !path.trim().is_empty() => KeyStore::from_pem_file(path, kid),
            _ => Err(KeyError::Missing),
        }
    }

    pub fn token_ttl(&self) -> Option<Duration> {
        self.token_ttl_secs.map(Duration::from_secs)
    }

    pub fn service_token_ttl(&self) -> Duration {
        Duration::from_secs(self.service_token_ttl_secs)
    }

    pub fn outbound_timeout(&self) -> Duration {
        Duration::from_millis(self.outbound_timeout_ms)
    }

    pub fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig {
            requests_per_minute: self.login_rate_limit_per_minute,
            trust_forwarded_for: self.trust_forwarded_for,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
