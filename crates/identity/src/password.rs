//! Argon2 password hashing.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::{Error, Result};

/// Hash a plaintext password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| Error::external("hash password", HashError(e.to_string())))?;
    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored hash. Unparseable hashes
/// verify as false rather than erroring.
pub fn verify_password(password: &str, hash_str: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash_str) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Generate a random password for seeded accounts (96 bits, base64url).
pub fn generate_password() -> String {
    use {base64::Engine, rand::RngCore};

    let mut bytes = [0u8; 12];
    rand::rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

// argon2's error type does not implement std::error::Error; carry the message.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct HashError(String);
