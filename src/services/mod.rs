//! Services module
//!
//! This module contains business logic services

pub mod participation;
pub mod user;
pub mod validation;

// Re-export commonly used services
pub use participation::{JoinOutcome, LeaveOutcome, ParticipationCoordinator, ReconcileReport};
pub use user::ProfileService;

use std::sync::Arc;

use crate::config::settings::Settings;
use crate::database::store::{EventStore, UserStore};
use crate::database::{DatabaseService, InMemoryEventStore, InMemoryUserStore};

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub participation: ParticipationCoordinator,
    pub profiles: ProfileService,
    database: Option<DatabaseService>,
}

impl ServiceFactory {
    /// Build services over any pair of stores
    pub fn new(events: Arc<dyn EventStore>, users: Arc<dyn UserStore>, settings: &Settings) -> Self {
        Self {
            participation: ParticipationCoordinator::new(events.clone(), users.clone(), settings),
            profiles: ProfileService::new(events, users),
            database: None,
        }
    }

    /// Build services over the PostgreSQL repositories
    pub fn from_database(database: &DatabaseService, settings: &Settings) -> Self {
        Self {
            database: Some(database.clone()),
            ..Self::new(database.event_store(), database.user_store(), settings)
        }
    }

    /// Build services over fresh in-memory stores
    pub fn in_memory(settings: &Settings) -> Self {
        Self::new(
            Arc::new(InMemoryEventStore::new()),
            Arc::new(InMemoryUserStore::new()),
            settings,
        )
    }

    /// Health check for all services
    pub async fn health_check(&self) -> ServiceHealthStatus {
        let (database_configured, database_healthy) = match &self.database {
            Some(database) => (true, database.health_check().await.is_ok()),
            None => (false, true),
        };

        ServiceHealthStatus {
            database_configured,
            database_healthy,
            participation_ready: true,
            profiles_ready: true,
        }
    }
}

/// Health status for all services
#[derive(Debug, Clone)]
pub struct ServiceHealthStatus {
    /// False when running over in-memory stores
    pub database_configured: bool,
    pub database_healthy: bool,
    pub participation_ready: bool,
    pub profiles_ready: bool,
}

impl ServiceHealthStatus {
    /// Check if all critical services are healthy
    pub fn is_healthy(&self) -> bool {
        self.database_healthy && self.participation_ready && self.profiles_ready
    }

    /// Get list of unhealthy services
    pub fn get_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !self.database_healthy {
            issues.push("Database connection failed".to_string());
        }
        if !self.participation_ready {
            issues.push("Participation coordinator not ready".to_string());
        }
        if !self.profiles_ready {
            issues.push("Profile service not ready".to_string());
        }

        issues
    }
}
