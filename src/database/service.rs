//! Database service layer
//!
//! Owns the shared connection pool and the repositories built on it

use std::sync::Arc;

use crate::database::{DatabasePool, EventRepository, UserRepository};
use crate::database::store::{EventStore, UserStore};
use crate::utils::errors::HelpingHandsError;

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pool: DatabasePool,
    pub events: EventRepository,
    pub users: UserRepository,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            events: EventRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            pool,
        }
    }

    /// Event store handle for injection into services
    pub fn event_store(&self) -> Arc<dyn EventStore> {
        Arc::new(self.events.clone())
    }

    /// User store handle for injection into services
    pub fn user_store(&self) -> Arc<dyn UserStore> {
        Arc::new(self.users.clone())
    }

    pub async fn health_check(&self) -> Result<(), HelpingHandsError> {
        super::connection::health_check(&self.pool).await
    }

    /// Close the pool, waiting for checked-out connections to be returned
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
