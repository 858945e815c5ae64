//! Configuration module - Environment and file-based configuration management.

use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};

/// Main application configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Database configuration. `path` is a SQLite file path, or `:memory:` for an
/// ephemeral store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_expiration_days: i64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
            },
            database: DatabaseConfig {
                path: "bitsa.db".to_string(),
            },
            auth: AuthConfig {
                jwt_secret: "default-secret-key-change-in-production-now".to_string(),
                token_expiration_days: 7,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration with priority: environment variables over config
    /// files over defaults.
    pub fn load() -> Result<Self, ConfigError> {
        if std::path::Path::new(".env").exists() {
            dotenvy::dotenv().ok();
        }

        let defaults = Config::try_from(&AppConfig::default())?;
        let config = Config::builder()
            .add_source(defaults)
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("BITSA").separator("__"))
            .build()?;
        config.try_deserialize()
    }

    /// Get server bind address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.auth.jwt_secret.len() < 32 {
            return Err("JWT secret must be at least 32 characters long".to_string());
        }

        if self.auth.token_expiration_days < 1 {
            return Err("Token expiration must be at least one day".to_string());
        }

        if self.server.port == 0 {
            return Err("Server port cannot be 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.database.path, "bitsa.db");
        assert_eq!(config.auth.token_expiration_days, 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = "short".to_string();
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.auth.token_expiration_days = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_server_addr() {
        let config = AppConfig::default();
        assert_eq!(config.server_addr(), "127.0.0.1:5000");
    }
}
