//! Database module
//!
//! This module handles database connections, the store contracts and their
//! PostgreSQL and in-memory implementations

pub mod connection;
pub mod memory;
pub mod repositories;
pub mod service;
pub mod store;

// Re-export commonly used database components
pub use connection::{DatabasePool, create_pool, run_migrations, health_check};
pub use memory::{InMemoryEventStore, InMemoryUserStore};
pub use repositories::{UserRepository, EventRepository};
pub use service::DatabaseService;
pub use store::{AppendOutcome, EventStore, RemoveOutcome, UserStore};
