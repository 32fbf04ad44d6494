use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand_core::OsRng;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("failed to hash password: {0}")]
    Hash(String),
    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),
    #[error("password does not match")]
    Mismatch,
}

/// Hash a password with Argon2id and a fresh random salt.
/// Returns a PHC-formatted string suitable for storing as-is.
pub fn hash_password(plaintext: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Check a plaintext password against a stored PHC hash.
pub fn verify_password(hashed: &str, plaintext: &str) -> Result<(), PasswordError> {
    let parsed =
        PasswordHash::new(hashed).map_err(|e| PasswordError::MalformedHash(e.to_string()))?;

    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .map_err(|_| PasswordError::Mismatch)
}
