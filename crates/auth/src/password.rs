//! Password hashing and verification (argon2id, PHC strings).
//!
//! Verification re-derives the candidate hash with the parameters and salt
//! encoded in the stored PHC string and compares in constant time.

use std::sync::OnceLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use bizdir_core::{DomainError, DomainResult};

use crate::AuthError;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

pub fn hash_password(plain: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::internal(format!("password hashing failed: {e}")))
}

/// Returns `false` for a mismatch and for an unparseable stored hash alike.
pub fn verify_password(hash: &str, plain: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default().verify_password(plain.as_bytes(), &parsed).is_ok()
}

/// Run a full verification against a throwaway hash.
///
/// Lets a lookup miss cost the same as a wrong password. Always `false`.
pub fn verify_against_placeholder(plain: &str) -> bool {
    static PLACEHOLDER: OnceLock<Option<String>> = OnceLock::new();
    if let Some(hash) = PLACEHOLDER.get_or_init(|| hash_password("placeholder-credential").ok()) {
        let _ = verify_password(hash, plain);
    }
    false
}

pub fn validate_password(plain: &str) -> DomainResult<()> {
    if plain.is_empty() {
        return Err(DomainError::validation("password is required"));
    }
    if plain.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(DomainError::validation(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}
