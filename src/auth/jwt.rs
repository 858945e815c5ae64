//! JWT token handling and validation.
//!
//! Tokens carry the subject id and expiry only. The role is deliberately not
//! embedded: it is re-read from the store on every request, so a role change
//! takes effect without re-login.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// JWT token claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Issued at timestamp
    pub iat: u64,
    /// Expiration timestamp
    pub exp: u64,
}

/// JWT service configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens
    pub secret: String,
    /// Token lifetime
    pub expiration: Duration,
}

impl JwtConfig {
    pub fn new(secret: &str, expiration_days: i64) -> Self {
        Self {
            secret: secret.to_string(),
            expiration: Duration::from_secs(expiration_days.max(0) as u64 * 24 * 60 * 60),
        }
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "default-secret-key-change-in-production-now".to_string(),
            expiration: Duration::from_secs(7 * 24 * 60 * 60), // 7 days
        }
    }
}

/// Errors that can occur during JWT operations
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,
}

/// JWT service for token management
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    /// Create a new JWT service with configuration
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Issue a session token for a user.
    pub fn issue(&self, user_id: &str) -> Result<String, JwtError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| JwtError::TokenCreation(e.to_string()))?
            .as_secs();

        let claims = Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now + self.config.expiration.as_secs(),
        };

        let header = Header::new(Algorithm::HS256);
        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| JwtError::TokenCreation(e.to_string()))
    }

    /// Validate and decode a token.
    pub fn validate(&self, token: &str) -> Result<Claims, JwtError> {
        let validation = Validation::new(Algorithm::HS256);

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                _ => JwtError::InvalidToken,
            })?;

        Ok(token_data.claims)
    }
}

impl Default for JwtService {
    fn default() -> Self {
        Self::new(JwtConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_validate() {
        let service = JwtService::default();
        let token = service.issue("user123").unwrap();
        assert!(!token.is_empty());

        let claims = service.validate(&token).unwrap();
        assert_eq!(claims.sub, "user123");
        assert!(claims.exp > claims.iat);
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn test_expired_token() {
        let service = JwtService::default();

        let past = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
            .saturating_sub(14 * 24 * 60 * 60);

        let claims = Claims {
            sub: "user123".to_string(),
            iat: past,
            exp: past + 60,
        };

        let header = Header::new(Algorithm::HS256);
        let token = encode(&header, &claims, &service.encoding_key).unwrap();

        assert!(matches!(
            service.validate(&token),
            Err(JwtError::TokenExpired)
        ));
    }

    #[test]
    fn test_tampered_token() {
        let service = JwtService::default();
        let token = service.issue("user123").unwrap();

        // A token signed with a different secret must not validate.
        let other = JwtService::new(JwtConfig {
            secret: "another-secret-key-that-is-long-enough!".to_string(),
            ..JwtConfig::default()
        });
        assert!(matches!(
            other.validate(&token),
            Err(JwtError::InvalidToken)
        ));

        // Neither does a corrupted payload.
        let mut corrupted = token.clone();
        corrupted.replace_range(10..12, "xx");
        assert!(service.validate(&corrupted).is_err());
    }
}
