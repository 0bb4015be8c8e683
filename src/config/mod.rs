//! Configuration module for Vigil
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`VIGIL_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use vigil::config::VigilConfig;
//!
//! // Load defaults
//! let config = VigilConfig::default();
//! assert_eq!(config.connection.reconnect_delay_seconds, 3);
//!
//! // Parse from TOML
//! let toml = r#"
//! [connection]
//! origin = "https://fleet.example.com"
//! "#;
//! let config: VigilConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.connection.origin, "https://fleet.example.com");
//! ```

pub mod connection;
pub mod error;
pub mod logging;

pub use connection::ConnectionConfig;
pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Unified configuration for the Vigil dashboard client.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VigilConfig {
    /// Push channel connection settings
    pub connection: ConnectionConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl VigilConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supports VIGIL_* environment variables for common settings.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(origin) = std::env::var("VIGIL_ORIGIN") {
            self.connection.origin = origin;
        }
        if let Ok(delay) = std::env::var("VIGIL_RECONNECT_DELAY") {
            if let Ok(d) = delay.parse() {
                self.connection.reconnect_delay_seconds = d;
            }
        }
        if let Ok(level) = std::env::var("VIGIL_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("VIGIL_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connection.origin.is_empty() {
            return Err(ConfigError::Validation {
                field: "connection.origin".to_string(),
                message: "origin cannot be empty".to_string(),
            });
        }
        if !self.connection.path.starts_with('/') {
            return Err(ConfigError::Validation {
                field: "connection.path".to_string(),
                message: "path must start with '/'".to_string(),
            });
        }
        if self.connection.reconnect_delay_seconds == 0 {
            return Err(ConfigError::Validation {
                field: "connection.reconnect_delay_seconds".to_string(),
                message: "reconnect delay must be non-zero".to_string(),
            });
        }

        Ok(())
    }
}
