//! Error types for key loading, issuance and verification.
//!
//! Verification failures are deliberately fine-grained here so they can be
//! logged precisely; callers at the HTTP boundary collapse them into a single
//! unauthenticated outcome (see [`VerifyError::is_internal`]).

use thiserror::Error;

/// Failures while loading the signing key pair.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("no signing key configured")]
    Missing,

    #[error("failed to read signing key file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse RSA private key: {0}")]
    InvalidPrivateKey(String),

    #[error("failed to build signing key: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
}

/// Failures while minting a token.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("refusing to issue a token without roles")]
    EmptyRoles,

    #[error("failed to serialize token segment: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Failures while hashing or checking a password.
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("failed to hash password: {0}")]
    Hash(String),

    #[error("stored password hash is unreadable: {0}")]
    InvalidHash(String),
}

/// Failures while resolving a public key from the key set.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JwksError {
    #[error("no key with kid {0:?} in the key set")]
    KeyNotFound(String),

    #[error("failed to fetch key set: {0}")]
    KeyFetchFailed(String),

    #[error("key set document is malformed: {0}")]
    MalformedKeySet(String),
}

/// Failures while verifying a presented token.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("token is malformed: {0}")]
    Malformed(String),

    #[error("algorithm {0:?} is not accepted")]
    DisallowedAlgorithm(String),

    #[error("token header has no kid")]
    MissingKeyId,

    #[error(transparent)]
    Key(#[from] JwksError),

    #[error("signature does not match")]
    BadSignature,

    #[error("token has expired")]
    Expired,

    #[error("token has no expiry and one is required")]
    MissingExpiry,

    #[error("token carries no roles")]
    MissingRoles,

    #[error("token claims are invalid: {0}")]
    InvalidClaims(String),
}

impl VerifyError {
    /// True when the failure is a fault on our side (an unusable key set)
    /// rather than a problem with the presented token. Such failures still
    /// reject the request, but as a server error.
    pub fn is_internal(&self) -> bool {
        matches!(self, VerifyError::Key(JwksError::MalformedKeySet(_)))
    }
}

impl From<jsonwebtoken::errors::Error> for VerifyError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature => VerifyError::BadSignature,
            ErrorKind::ExpiredSignature => VerifyError::Expired,
            ErrorKind::InvalidAlgorithm => VerifyError::DisallowedAlgorithm("mismatch".to_string()),
            ErrorKind::MissingRequiredClaim(claim) if claim == "exp" => VerifyError::MissingExpiry,
            ErrorKind::MissingRequiredClaim(claim) => {
                VerifyError::InvalidClaims(format!("missing claim {claim}"))
            }
            ErrorKind::Json(e) => VerifyError::InvalidClaims(e.to_string()),
            _ => VerifyError::Malformed(err.to_string()),
        }
    }
}
