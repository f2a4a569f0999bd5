//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub participation: ParticipationConfig,
    pub pagination: PaginationConfig,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for the daily-rolling log file
    pub directory: String,
    pub file_prefix: String,
    pub json: bool,
}

/// Join/leave protocol tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ParticipationConfig {
    /// Attempts at the atomic append before a lost race surfaces as a conflict
    pub max_join_attempts: u32,
    /// Attempts at the best-effort user index write after the event write
    pub index_sync_attempts: u32,
    /// Base delay between retries, doubled per attempt and jittered
    pub index_retry_backoff_ms: u64,
}

/// Listing page size limits
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Settings {
    /// Load settings from an optional `config` file and `HELPINGHANDS__*` environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Settings::default())?)
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("HELPINGHANDS").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    /// Load settings from an explicit file, layered over the defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Settings::default())?)
            .add_source(config::File::from(path.as_ref()))
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::HelpingHandsError> {
        super::validation::validate_settings(self)
    }
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_seconds)
    }
}

impl ParticipationConfig {
    pub fn index_retry_backoff(&self) -> Duration {
        Duration::from_millis(self.index_retry_backoff_ms)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/helpinghands".to_string(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_seconds: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: "logs".to_string(),
            file_prefix: "helpinghands.log".to_string(),
            json: false,
        }
    }
}

impl Default for ParticipationConfig {
    fn default() -> Self {
        Self {
            max_join_attempts: 3,
            index_sync_attempts: 3,
            index_retry_backoff_ms: 50,
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 12,
            max_limit: 100,
        }
    }
}
