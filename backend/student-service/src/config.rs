/// Configuration management
///
/// Loaded from the environment with `envy`; see the auth service for the
/// naming convention.
use std::sync::Arc;
use std::time::Duration;

use actix_middleware::LogFormat;
use crypto_core::jwt::DEFAULT_LEEWAY_SECS;
use crypto_core::{HttpJwksSource, JwksClient, JwksError, TokenVerifier};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_jwks_url")]
    pub jwks_url: String,
    /// Minimum gap between refetches triggered by an unknown `kid`
    #[serde(default = "default_jwks_refresh_cooldown_secs")]
    pub jwks_refresh_cooldown_secs: u64,
    #[serde(default = "default_token_leeway_secs")]
    pub token_leeway_secs: u64,
    /// Reject tokens that carry no `exp`
    #[serde(default)]
    pub require_token_expiry: bool,

    #[serde(default = "default_outbound_timeout_ms")]
    pub outbound_timeout_ms: u64,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5003
}

fn default_jwks_url() -> String {
    "http://localhost:5001/.well-known/jwks.json".to_string()
}

fn default_jwks_refresh_cooldown_secs() -> u64 {
    10
}

fn default_token_leeway_secs() -> u64 {
    DEFAULT_LEEWAY_SECS
}

fn default_outbound_timeout_ms() -> u64 {
    5000
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    pub fn outbound_timeout(&self) -> Duration {
        Duration::from_millis(self.outbound_timeout_ms)
    }

    /// Verifier backed by the auth service's key set. Nothing is fetched
    /// until the first token arrives.
    pub fn token_verifier(&self) -> Result<TokenVerifier, JwksError> {
        let source = HttpJwksSource::new(self.jwks_url.clone(), self.outbound_timeout())?;
        let jwks = JwksClient::new(Arc::new(source))
            .with_refresh_cooldown(Duration::from_secs(self.jwks_refresh_cooldown_secs));

        Ok(TokenVerifier::new(Arc::new(jwks))
            .with_leeway(self.token_leeway_secs)
            .require_expiry(self.require_token_expiry))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
