//! Password hashing behind a two-function surface so the algorithm stays
//! swappable. Argon2id with a per-hash random salt; verification is
//! deterministic, the transform is one-way.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::errors::AppError;

pub fn hash_password(plaintext: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::internal("failed to hash password").with_cause(anyhow::anyhow!("{e}")))
}

/// A malformed stored hash verifies as false rather than erroring: the
/// caller only ever learns pass/fail.
pub fn verify_password(plaintext: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}
