//! Test helpers module
//!
//! Builders for identities and requests, store doubles that inject failures,
//! and the PostgreSQL test database used by the ignored store tests.

#![allow(dead_code)]

pub mod database_helper;
pub mod store_doubles;
pub mod test_data;

pub use database_helper::*;
pub use store_doubles::*;
pub use test_data::*;

use std::sync::Arc;

use HelpingHands::config::Settings;
use HelpingHands::database::store::{EventStore, UserStore};
use HelpingHands::database::{InMemoryEventStore, InMemoryUserStore};
use HelpingHands::services::{ParticipationCoordinator, ProfileService};

/// Settings with retry delays short enough for tests
pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.participation.index_retry_backoff_ms = 1;
    settings
}

/// Services over in-memory stores, with direct handles on the stores
pub struct TestContext {
    pub events: InMemoryEventStore,
    pub users: InMemoryUserStore,
    pub coordinator: ParticipationCoordinator,
    pub profiles: ProfileService,
}

impl TestContext {
    pub fn new() -> Self {
        let events = InMemoryEventStore::new();
        let users = InMemoryUserStore::new();
        let coordinator = ParticipationCoordinator::new(
            Arc::new(events.clone()),
            Arc::new(users.clone()),
            &test_settings(),
        );
        Self::assemble(events, users, coordinator)
    }

    /// Route the coordinator's user index writes through `wrap`
    pub fn with_user_store(wrap: impl FnOnce(InMemoryUserStore) -> Arc<dyn UserStore>) -> Self {
        let events = InMemoryEventStore::new();
        let users = InMemoryUserStore::new();
        let coordinator = ParticipationCoordinator::new(Arc::new(events.clone()), wrap(users.clone()), &test_settings());
        Self::assemble(events, users, coordinator)
    }

    /// Route the coordinator's event writes through `wrap`
    pub fn with_event_store(wrap: impl FnOnce(InMemoryEventStore) -> Arc<dyn EventStore>) -> Self {
        let events = InMemoryEventStore::new();
        let users = InMemoryUserStore::new();
        let coordinator = ParticipationCoordinator::new(wrap(events.clone()), Arc::new(users.clone()), &test_settings());
        Self::assemble(events, users, coordinator)
    }

    fn assemble(events: InMemoryEventStore, users: InMemoryUserStore, coordinator: ParticipationCoordinator) -> Self {
        let profiles = ProfileService::new(Arc::new(events.clone()), Arc::new(users.clone()));
        Self {
            events,
            users,
            coordinator,
            profiles,
        }
    }
}
