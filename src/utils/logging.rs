//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the HelpingHands application.

use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::config::LoggingConfig;
use crate::utils::errors::{HelpingHandsError, Result};

/// Initialize logging based on configuration.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(&config.directory, &config.file_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_new(&config.level)
        .map_err(|e| HelpingHandsError::Config(format!("Invalid log filter '{}': {}", config.level, e)))?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if config.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stdout))
            .with(fmt::layer().json().with_ansi(false).with_writer(non_blocking))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stdout))
            .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
            .try_init()
    };
    installed.map_err(|e| HelpingHandsError::Config(format!("Failed to install log subscriber: {}", e)))?;

    info!(level = %config.level, json = config.json, "Logging initialized");
    Ok(guard)
}

/// Log event management actions
pub fn log_event_action(event_id: Uuid, action: &str, user_id: &str, details: Option<&str>) {
    info!(
        event_id = %event_id,
        action = action,
        user_id = user_id,
        details = details,
        "Event action performed"
    );
}

/// Log a committed change to an event's participant list
pub fn log_membership_change(event_id: Uuid, user_id: &str, action: &str, participant_count: usize, capacity: u32) {
    info!(
        event_id = %event_id,
        user_id = user_id,
        action = action,
        participant_count = participant_count,
        capacity = capacity,
        "Membership changed"
    );
}

/// Log a user index that could not be brought in line with the event store
pub fn log_index_desync(event_id: Uuid, user_id: &str, action: &str, error: &HelpingHandsError) {
    error!(
        event_id = %event_id,
        user_id = user_id,
        action = action,
        error = %error,
        "User index out of sync with event; repair with reconcile_user_index"
    );
}

/// Log store operations
pub fn log_store_operation(operation: &str, store: &str, duration_ms: u64, success: bool) {
    if success {
        debug!(
            operation = operation,
            store = store,
            duration_ms = duration_ms,
            "Store operation completed"
        );
    } else {
        warn!(
            operation = operation,
            store = store,
            duration_ms = duration_ms,
            "Store operation failed"
        );
    }
}
