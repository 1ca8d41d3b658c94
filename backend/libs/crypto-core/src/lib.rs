//! Token primitives shared by the campus services.
//!
//! - [`keys`]: the issuer's RSA key pair and its public JWKS form
//! - [`jwt`]: roles, claims, [`TokenIssuer`](jwt::TokenIssuer) and
//!   [`TokenVerifier`](jwt::TokenVerifier)
//! - [`jwks`]: key set document and the verifier-side cache
//! - [`password`]: credential hashing

pub mod error;
pub mod jwks;
pub mod jwt;
pub mod keys;
pub mod password;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::{JwksError, KeyError, PasswordError, TokenError, VerifyError};
pub use jwks::{HttpJwksSource, JwksClient, JwksDocument, JwksSource};
pub use jwt::{Claims, Principal, Role, RoleSet, TokenIssuer, TokenVerifier};
pub use keys::KeyStore;
