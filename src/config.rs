//! Configuration module for Zephyr.

use serde::Deserialize;
use std::path::Path;

use crate::{Result, ZephyrError};

/// Environment variable overriding the JWT secret.
pub const ENV_JWT_SECRET: &str = "ZEPHYR_JWT_SECRET";

/// Environment variable overriding the storage root directory.
pub const ENV_STORAGE_ROOT: &str = "ZEPHYR_STORAGE_ROOT";

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/zephyr.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Per-user storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory under which every user's storage root is created.
    #[serde(default = "default_storage_root")]
    pub root_path: String,
    /// Quota assigned to newly created profiles, in bytes.
    #[serde(default = "default_quota_bytes")]
    pub default_quota_bytes: Option<u64>,
    /// Maximum request body size for uploads, in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
}

fn default_storage_root() -> String {
    "data/users".to_string()
}

fn default_quota_bytes() -> Option<u64> {
    Some(crate::storage::DEFAULT_QUOTA_BYTES)
}

fn default_max_upload_size() -> u64 {
    1024
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root_path: default_storage_root(),
            default_quota_bytes: default_quota_bytes(),
            max_upload_size_mb: default_max_upload_size(),
        }
    }
}

impl StorageConfig {
    /// Create a storage configuration rooted at the given directory.
    pub fn with_root(root_path: impl Into<String>) -> Self {
        Self {
            root_path: root_path.into(),
            ..Self::default()
        }
    }

    /// Set the default quota for new profiles.
    pub fn with_default_quota(mut self, quota: Option<u64>) -> Self {
        self.default_quota_bytes = quota;
        self
    }

    /// Maximum upload body size in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        (self.max_upload_size_mb * 1024 * 1024) as usize
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/zephyr.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Web API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// Host address to bind.
    #[serde(default = "default_web_host")]
    pub host: String,
    /// Port number for the Web API.
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// JWT secret key.
    #[serde(default)]
    pub jwt_secret: String,
    /// Access token expiry in seconds.
    #[serde(default = "default_jwt_access_expiry")]
    pub jwt_access_token_expiry_secs: u64,
    /// Refresh token expiry in days.
    #[serde(default = "default_jwt_refresh_expiry")]
    pub jwt_refresh_token_expiry_days: u64,
}

fn default_web_host() -> String {
    "0.0.0.0".to_string()
}

fn default_web_port() -> u16 {
    8080
}

fn default_jwt_access_expiry() -> u64 {
    900 // 15 minutes
}

fn default_jwt_refresh_expiry() -> u64 {
    7
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
            cors_origins: vec![],
            jwt_secret: String::new(),
            jwt_access_token_expiry_secs: default_jwt_access_expiry(),
            jwt_refresh_token_expiry_days: default_jwt_refresh_expiry(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Web API configuration.
    #[serde(default)]
    pub web: WebConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ZephyrError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| ZephyrError::Validation(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `ZEPHYR_JWT_SECRET`: Override the JWT secret key
    /// - `ZEPHYR_STORAGE_ROOT`: Override the storage root directory
    pub fn apply_env_overrides(&mut self) {
        if let Ok(jwt_secret) = std::env::var(ENV_JWT_SECRET) {
            if !jwt_secret.is_empty() {
                self.web.jwt_secret = jwt_secret;
            }
        }
        if let Ok(root) = std::env::var(ENV_STORAGE_ROOT) {
            if !root.is_empty() {
                self.storage.root_path = root;
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if the JWT secret is not set or the storage root is empty.
    pub fn validate(&self) -> Result<()> {
        if self.web.jwt_secret.is_empty() {
            return Err(ZephyrError::Validation(format!(
                "jwt_secret is not set. Set it in config.toml or via {ENV_JWT_SECRET} environment variable."
            )));
        }
        if self.storage.root_path.trim().is_empty() {
            return Err(ZephyrError::Config(
                "storage.root_path must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
