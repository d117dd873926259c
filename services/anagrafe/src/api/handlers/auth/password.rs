//! Password hashing and verification (Argon2id, PHC strings).

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, SaltString},
    Argon2, PasswordHasher, PasswordVerifier,
};

/// Hash a plaintext password into a salted PHC string.
///
/// Every call draws a fresh salt, so hashing the same input twice yields two
/// different strings that both verify.
///
/// # Errors
///
/// Returns an error if the hashing backend rejects its parameters.
pub(crate) fn hash(plaintext: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|err| anyhow!("failed to hash password: {err}"))?;
    Ok(hash.to_string())
}

/// Check a plaintext candidate against a stored hash.
///
/// The comparison is delegated to the hashing library, never done with plain
/// equality. A malformed or foreign-format `stored` value verifies as false
/// rather than erroring in the hot path.
pub(crate) fn verify(plaintext: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}
