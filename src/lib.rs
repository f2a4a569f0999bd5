//! HelpingHands event registration backend
//!
//! Volunteers publish community events, and other users browse, join and
//! leave them. This library provides the event and user stores, the
//! participation coordinator that keeps them consistent, and the ambient
//! configuration, logging and error plumbing around them.

#![allow(non_snake_case)]

pub mod config;
pub mod database;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{HelpingHandsError, Result};

// Re-export main components for easy access
pub use database::DatabaseService;
pub use services::{ParticipationCoordinator, ProfileService, ServiceFactory};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
