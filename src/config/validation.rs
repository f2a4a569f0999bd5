//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{HelpingHandsError, Result};
use super::Settings;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_database_config(&settings.database)?;
    validate_logging_config(&settings.logging)?;
    validate_participation_config(&settings.participation)?;
    validate_pagination_config(&settings.pagination)?;

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(HelpingHandsError::Config(
            "Database URL is required".to_string()
        ));
    }

    if config.max_connections == 0 {
        return Err(HelpingHandsError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(HelpingHandsError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(HelpingHandsError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(HelpingHandsError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    if config.directory.is_empty() || config.file_prefix.is_empty() {
        return Err(HelpingHandsError::Config(
            "Log directory and file prefix are required".to_string()
        ));
    }

    Ok(())
}

/// Validate participation protocol settings
fn validate_participation_config(config: &super::ParticipationConfig) -> Result<()> {
    if config.max_join_attempts == 0 {
        return Err(HelpingHandsError::Config(
            "Max join attempts must be greater than 0".to_string()
        ));
    }

    if config.index_sync_attempts == 0 {
        return Err(HelpingHandsError::Config(
            "Index sync attempts must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate pagination settings
fn validate_pagination_config(config: &super::PaginationConfig) -> Result<()> {
    if config.max_limit == 0 {
        return Err(HelpingHandsError::Config(
            "Max page limit must be greater than 0".to_string()
        ));
    }

    if config.default_limit == 0 || config.default_limit > config.max_limit {
        return Err(HelpingHandsError::Config(
            format!("Default page limit must be between 1 and {}", config.max_limit)
        ));
    }

    Ok(())
}
