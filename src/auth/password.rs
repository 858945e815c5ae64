//! Password hashing and verification utilities.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

/// Errors that can occur during password operations
#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Password verification failed: {0}")]
    Verification(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

/// Service for password hashing and verification
pub struct PasswordService {
    argon2: Argon2<'static>,
}

impl PasswordService {
    pub fn new() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }

    /// Hash a password with a fresh random salt.
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::Hashing(e.to_string()))?;

        Ok(password_hash.to_string())
    }

    /// Verify a password against a stored hash. The comparison inside the
    /// argon2 verifier is constant-time.
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHashFormat)?;

        match self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
        {
            Ok(_) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::Verification(e.to_string())),
        }
    }
}

impl Default for PasswordService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hashing() {
        let service = PasswordService::new();
        let password = "test_password_123";

        let hash = service.hash_password(password).unwrap();
        assert!(!hash.is_empty());
        assert_ne!(hash, password);

        assert!(service.verify_password(password, &hash).unwrap());
        assert!(!service.verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_distinct_salts() {
        let service = PasswordService::new();
        let a = service.hash_password("same-password").unwrap();
        let b = service.hash_password("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash() {
        let service = PasswordService::new();
        assert!(matches!(
            service.verify_password("whatever", "not-a-phc-string"),
            Err(PasswordError::InvalidHashFormat)
        ));
    }
}
