//! Password hashing for stored credentials.
//!
//! New hashes are Argon2id PHC strings. Records imported from the previous
//! deployment carry bcrypt hashes (`$2a$`, `$2b$`, `$2y$`), which still verify.

use argon2::{
    password_hash::{PasswordHasher, SaltString},
    Argon2, PasswordHash, PasswordVerifier,
};

use crate::error::PasswordError;

/// Hash a password using Argon2id.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(rand::thread_rng());

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Check `password` against a stored hash.
///
/// `Ok(false)` means the password is wrong; `Err` means the stored hash itself
/// could not be read.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    if is_bcrypt_hash(stored_hash) {
        return bcrypt::verify(password, stored_hash)
            .map_err(|e| PasswordError::InvalidHash(e.to_string()));
    }

    let parsed =
        PasswordHash::new(stored_hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn is_bcrypt_hash(hash: &str) -> bool {
    ["$2a$", "$2b$", "$2y$"]
        .iter()
        .any(|prefix| hash.starts_with(prefix))
}
