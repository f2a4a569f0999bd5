//! Database repositories module
//!
//! PostgreSQL implementations of the event and user stores

pub mod user;
pub mod event;

// Re-export repositories
pub use user::UserRepository;
pub use event::EventRepository;
