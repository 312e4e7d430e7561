//! # ih-auth-simple
//!
//! Argon2-based implementation of `AuthProvider`. Turns registration
//! passwords into PHC strings and checks login attempts against them.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use ih_core::error::{AppError, Result};
use ih_core::traits::AuthProvider;

#[derive(Default)]
pub struct SimplePasswordAuth;

impl SimplePasswordAuth {
    pub fn new() -> Self {
        Self
    }
}

impl AuthProvider for SimplePasswordAuth {
    /// Hashes with a fresh random salt. The PHC string carries everything
    /// verification needs, so nothing else is stored.
    fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|err| AppError::Internal(format!("password hashing failed: {err}")))?;
        Ok(hash.to_string())
    }

    /// Verifies a plaintext password against a stored Argon2 hash.
    /// A malformed stored hash counts as a failed login, not an error.
    fn verify_password(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(_) => return false,
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}
