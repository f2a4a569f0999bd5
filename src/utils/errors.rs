//! Error handling for HelpingHands
//!
//! This module defines the main error type used throughout the application
//! and maps infrastructure failures onto the participation error taxonomy.

use thiserror::Error;
use uuid::Uuid;

/// Main error type for HelpingHands
#[derive(Error, Debug)]
pub enum HelpingHandsError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Event not found: {event_id}")]
    EventNotFound { event_id: Uuid },

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: String },

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("User {user_id} already joined event {event_id}")]
    AlreadyJoined { event_id: Uuid, user_id: String },

    #[error("Event {event_id} is full (capacity {capacity})")]
    EventFull { event_id: Uuid, capacity: u32 },

    #[error("Event {event_id} has already taken place")]
    EventEnded { event_id: Uuid },

    #[error("Concurrent update conflict: {0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for HelpingHands operations
pub type Result<T> = std::result::Result<T, HelpingHandsError>;

/// SQLSTATE codes reported when a concurrent transaction won the race
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

impl From<sqlx::Error> for HelpingHandsError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_) => HelpingHandsError::StoreUnavailable(err.to_string()),
            sqlx::Error::Database(db_err)
                if matches!(db_err.code().as_deref(), Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED)) =>
            {
                HelpingHandsError::Conflict(err.to_string())
            }
            _ => HelpingHandsError::Database(err),
        }
    }
}

impl From<config::ConfigError> for HelpingHandsError {
    fn from(err: config::ConfigError) -> Self {
        HelpingHandsError::Config(err.to_string())
    }
}

/// Stable, caller-facing classification of an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Forbidden,
    AlreadyJoined,
    EventFull,
    EventEnded,
    Conflict,
    StoreUnavailable,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation_error",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::AlreadyJoined => "already_joined",
            ErrorKind::EventFull => "event_full",
            ErrorKind::EventEnded => "event_ended",
            ErrorKind::Conflict => "conflict",
            ErrorKind::StoreUnavailable => "store_unavailable",
            ErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl HelpingHandsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HelpingHandsError::Validation(_) => ErrorKind::Validation,
            HelpingHandsError::EventNotFound { .. } => ErrorKind::NotFound,
            HelpingHandsError::UserNotFound { .. } => ErrorKind::NotFound,
            HelpingHandsError::Forbidden(_) => ErrorKind::Forbidden,
            HelpingHandsError::AlreadyJoined { .. } => ErrorKind::AlreadyJoined,
            HelpingHandsError::EventFull { .. } => ErrorKind::EventFull,
            HelpingHandsError::EventEnded { .. } => ErrorKind::EventEnded,
            HelpingHandsError::Conflict(_) => ErrorKind::Conflict,
            HelpingHandsError::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
            HelpingHandsError::Database(_)
            | HelpingHandsError::Migration(_)
            | HelpingHandsError::Config(_)
            | HelpingHandsError::Io(_) => ErrorKind::Internal,
        }
    }

    /// Only lost races and transient infrastructure failures are worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Conflict | ErrorKind::StoreUnavailable)
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            HelpingHandsError::Database(_) => ErrorSeverity::Critical,
            HelpingHandsError::Migration(_) => ErrorSeverity::Critical,
            HelpingHandsError::Config(_) => ErrorSeverity::Critical,
            HelpingHandsError::StoreUnavailable(_) => ErrorSeverity::Error,
            HelpingHandsError::Io(_) => ErrorSeverity::Error,
            HelpingHandsError::Forbidden(_) => ErrorSeverity::Warning,
            HelpingHandsError::Conflict(_) => ErrorSeverity::Warning,
            _ => ErrorSeverity::Info,
        }
    }

    /// Response body for the calling layer
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": self.to_string(),
            "kind": self.kind().as_str(),
            "retryable": self.is_retryable(),
        })
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
