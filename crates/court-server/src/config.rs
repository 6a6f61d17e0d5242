//! Configuration file parsing for the court server.
//!
//! Loads settings from TOML files including bind address, JWT secret,
//! token expiry, database location and evidence storage.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Server configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Missing required field
    #[error("Missing required configuration field: {0}")]
    MissingField(String),
}

/// Server configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1")
    pub bind_address: String,

    /// Bind port (e.g., 8080)
    pub bind_port: u16,

    /// JWT secret for signing tokens
    pub jwt_secret: String,

    /// Token expiry in seconds (default: 3600 = 1 hour)
    #[serde(default = "default_token_expiry")]
    pub token_expiry_secs: u64,

    /// SQLite database file (default: "court.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Directory holding uploaded evidence files (default: "evidence")
    #[serde(default = "default_evidence_dir")]
    pub evidence_dir: PathBuf,

    /// Log filter used when `RUST_LOG` is unset (default: "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Largest accepted evidence upload in bytes (default: 10 MiB)
    #[serde(default = "default_max_evidence_bytes")]
    pub max_evidence_bytes: usize,
}

/// Default token expiry: 1 hour
fn default_token_expiry() -> u64 {
    3600
}

fn default_database_path() -> PathBuf {
    PathBuf::from("court.db")
}

fn default_evidence_dir() -> PathBuf {
    PathBuf::from("evidence")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_evidence_bytes() -> usize {
    court_service::DEFAULT_MAX_EVIDENCE_BYTES
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = toml::from_str(contents)?;

        if config.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingField("jwt_secret".to_string()));
        }

        Ok(config)
    }

    /// Create a default configuration for testing
    pub fn default_test_config() -> Self {
        ServerConfig {
            bind_address: "127.0.0.1".to_string(),
            bind_port: 8080,
            jwt_secret: "test-secret-key-do-not-use-in-production".to_string(),
            token_expiry_secs: default_token_expiry(),
            database_path: PathBuf::from(":memory:"),
            evidence_dir: default_evidence_dir(),
            log_level: default_log_level(),
            max_evidence_bytes: default_max_evidence_bytes(),
        }
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }
}
