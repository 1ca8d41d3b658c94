//! Signing key pair owned by the issuing service.
//!
//! The private half never leaves this type: it is parsed once at startup into
//! a `jsonwebtoken` encoding key, and only the public modulus/exponent are
//! exported through [`KeyStore::public_key_set`].

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::{Algorithm, EncodingKey};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use sha2::{Digest, Sha256};

use crate::error::KeyError;
use crate::jwks::{Jwk, JwksDocument};
use crate::jwt::JWT_ALGORITHM;

/// Detached signature produced by [`KeyStore::sign`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// base64url (unpadded) signature bytes
    pub value: String,
    pub kid: String,
    pub algorithm: Algorithm,
}

/// RS256 key pair with a stable key id.
pub struct KeyStore {
    kid: String,
    encoding_key: EncodingKey,
    jwk: Jwk,
}

impl KeyStore {
    /// Load a key pair from a PEM encoded RSA private key (PKCS#8 or PKCS#1).
    ///
    /// When `kid` is `None` the RFC 7638 thumbprint of the public key is used,
    /// so the id is stable across restarts for the same key.
    pub fn from_pem(private_key_pem: &str, kid: Option<String>) -> Result<Self, KeyError> {
        if private_key_pem.trim().is_empty() {
            return Err(KeyError::Missing);
        }

        let private_key = RsaPrivateKey::from_pkcs8_pem(private_key_pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(private_key_pem))
            .map_err(|e| KeyError::InvalidPrivateKey(e.to_string()))?;

        let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())?;

        let public_key = private_key.to_public_key();
        let n = URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be());
        let e = URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be());

        let kid = kid
            .filter(|k| !k.trim().is_empty())
            .unwrap_or_else(|| thumbprint(&n, &e));

        let jwk = Jwk::rsa(kid.clone(), n, e);

        Ok(Self {
            kid,
            encoding_key,
            jwk,
        })
    }

    /// Load from a PEM file on disk.
    pub fn from_pem_file(path: &str, kid: Option<String>) -> Result<Self, KeyError> {
        let pem = std::fs::read_to_string(path).map_err(|source| KeyError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_pem(&pem, kid)
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// The public half in JWKS form. Deterministic for a given key pair.
    pub fn public_key_set(&self) -> JwksDocument {
        JwksDocument {
            keys: vec![self.jwk.clone()],
        }
    }

    /// Sign `message` (the `header.body` signing input) with RS256.
    pub fn sign(&self, message: &[u8]) -> Result<Signature, jsonwebtoken::errors::Error> {
        let value = jsonwebtoken::crypto::sign(message, &self.encoding_key, JWT_ALGORITHM)?;
        Ok(Signature {
            value,
            kid: self.kid.clone(),
            algorithm: JWT_ALGORITHM,
        })
    }
}

impl std::fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyStore")
            .field("kid", &self.kid)
            .field("algorithm", &JWT_ALGORITHM)
            .finish_non_exhaustive()
    }
}

/// RFC 7638 JWK thumbprint: SHA-256 over the lexicographically ordered
/// required members, base64url encoded.
fn thumbprint(n: &str, e: &str) -> String {
    let canonical = format!(r#"{{"e":"{e}","kty":"RSA","n":"{n}"}}"#);
    URL_SAFE_NO_PAD.encode(Sha256::digest(canonical.as_bytes()))
}
