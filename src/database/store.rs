//! Store contracts consumed by the participation services
//!
//! Both the PostgreSQL repositories and the in-memory stores implement
//! these traits, so the services never depend on a concrete backend.

use async_trait::async_trait;

use crate::models::{Event, EventChanges, EventFilter, EventId, EventSort, Identity, Participant, UserProfile};
use crate::utils::errors::Result;

/// Result of an atomic, conditional participant append
#[derive(Debug, Clone, PartialEq)]
pub enum AppendOutcome {
    Appended(Event),
    AlreadyMember,
    Full { capacity: u32 },
    NotFound,
    NotActive,
}

/// Result of a participant removal
#[derive(Debug, Clone, PartialEq)]
pub enum RemoveOutcome {
    Removed(Event),
    /// The event exists but the user was not on its participant list
    NotMember(Event),
    NotFound,
}

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn create(&self, event: &Event) -> Result<EventId>;

    async fn get_by_id(&self, id: EventId) -> Result<Option<Event>>;

    /// Page of matching events plus the total number of matches
    async fn find(&self, filter: &EventFilter, sort: EventSort, offset: u64, limit: u64) -> Result<(Vec<Event>, u64)>;

    async fn update(&self, id: EventId, changes: &EventChanges) -> Result<Option<Event>>;

    /// Push the participant if the event is active, the user is not yet on
    /// the list and a slot is free. The check and the write must behave as
    /// one step per event id. A lost race may be reported as
    /// `HelpingHandsError::Conflict`.
    async fn append_participant(&self, id: EventId, participant: &Participant) -> Result<AppendOutcome>;

    async fn remove_participant(&self, id: EventId, user_id: &str) -> Result<RemoveOutcome>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn upsert_profile(&self, identity: &Identity) -> Result<UserProfile>;

    async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>>;

    /// Set-add; repeating it is harmless
    async fn add_joined_event(&self, uid: &str, event_id: EventId) -> Result<()>;

    /// Set-remove; removing an absent id succeeds
    async fn remove_joined_event(&self, uid: &str, event_id: EventId) -> Result<()>;

    /// Joined event ids in the order they were added; empty for unknown users
    async fn get_joined_event_ids(&self, uid: &str) -> Result<Vec<EventId>>;
}
