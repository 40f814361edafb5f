//! Argon2 password hashing.
//!
//! Digests are PHC strings, so salt and parameters travel with the hash and
//! `verify` needs nothing else. Comparison inside `argon2` is constant-time.

use argon2::Argon2;
use argon2::PasswordHash;
use argon2::PasswordHasher;
use argon2::PasswordVerifier;
use argon2::password_hash::SaltString;

pub use argon2::password_hash::Error as HashError;

fn salt() -> Result<SaltString, HashError> {
    use rand::Rng;
    let ref mut bytes = [0u8; 16];
    rand::rng().fill(bytes);
    SaltString::encode_b64(bytes)
}

pub fn hash(password: &str) -> Result<String, HashError> {
    Argon2::default()
        .hash_password(password.as_bytes(), &salt()?)
        .map(|h| h.to_string())
}

/// Returns false for a wrong password and for a digest that does not parse.
pub fn verify(password: &str, digest: &str) -> bool {
    PasswordHash::new(digest)
        .ok()
        .as_ref()
        .map(|hash| {
            Argon2::default()
                .verify_password(password.as_bytes(), hash)
                .is_ok()
        })
        .unwrap_or(false)
}
