//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod event;
pub mod query;
pub mod user;

// Re-export commonly used models
pub use event::{
    CreateEventRequest, Creator, Event, EventCategory, EventChanges, EventId, Participant,
    UpdateEventRequest,
};
pub use query::{EventFilter, EventQuery, EventSort, Page, PageRequest};
pub use user::{Identity, ProfileView, UserProfile};
