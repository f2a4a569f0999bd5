//! Store wrappers that inject failures into otherwise working stores

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use HelpingHands::database::store::{AppendOutcome, EventStore, RemoveOutcome, UserStore};
use HelpingHands::database::{InMemoryEventStore, InMemoryUserStore};
use HelpingHands::models::{Event, EventChanges, EventFilter, EventId, EventSort, Identity, Participant, UserProfile};
use HelpingHands::{HelpingHandsError, Result};

/// User store whose joined-index writes fail while the switch is on
#[derive(Clone)]
pub struct FailingUserStore {
    inner: InMemoryUserStore,
    failing: Arc<AtomicBool>,
    pub index_write_attempts: Arc<AtomicU32>,
}

impl FailingUserStore {
    pub fn new(inner: InMemoryUserStore) -> Self {
        Self {
            inner,
            failing: Arc::new(AtomicBool::new(true)),
            index_write_attempts: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        self.index_write_attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(HelpingHandsError::StoreUnavailable("user store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for FailingUserStore {
    async fn upsert_profile(&self, identity: &Identity) -> Result<UserProfile> {
        self.inner.upsert_profile(identity).await
    }

    async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>> {
        self.inner.get_profile(uid).await
    }

    async fn add_joined_event(&self, uid: &str, event_id: EventId) -> Result<()> {
        self.check()?;
        self.inner.add_joined_event(uid, event_id).await
    }

    async fn remove_joined_event(&self, uid: &str, event_id: EventId) -> Result<()> {
        self.check()?;
        self.inner.remove_joined_event(uid, event_id).await
    }

    async fn get_joined_event_ids(&self, uid: &str) -> Result<Vec<EventId>> {
        self.inner.get_joined_event_ids(uid).await
    }
}

/// Event store whose first `conflicts` appends report a lost race
#[derive(Clone)]
pub struct ConflictingEventStore {
    inner: InMemoryEventStore,
    remaining: Arc<AtomicU32>,
    pub append_attempts: Arc<AtomicU32>,
}

impl ConflictingEventStore {
    pub fn new(inner: InMemoryEventStore, conflicts: u32) -> Self {
        Self {
            inner,
            remaining: Arc::new(AtomicU32::new(conflicts)),
            append_attempts: Arc::new(AtomicU32::new(0)),
        }
    }
}

#[async_trait]
impl EventStore for ConflictingEventStore {
    async fn create(&self, event: &Event) -> Result<EventId> {
        self.inner.create(event).await
    }

    async fn get_by_id(&self, id: EventId) -> Result<Option<Event>> {
        self.inner.get_by_id(id).await
    }

    async fn find(&self, filter: &EventFilter, sort: EventSort, offset: u64, limit: u64) -> Result<(Vec<Event>, u64)> {
        self.inner.find(filter, sort, offset, limit).await
    }

    async fn update(&self, id: EventId, changes: &EventChanges) -> Result<Option<Event>> {
        self.inner.update(id, changes).await
    }

    async fn append_participant(&self, id: EventId, participant: &Participant) -> Result<AppendOutcome> {
        self.append_attempts.fetch_add(1, Ordering::SeqCst);
        let lost = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if lost {
            return Err(HelpingHandsError::Conflict("serialization failure".to_string()));
        }
        self.inner.append_participant(id, participant).await
    }

    async fn remove_participant(&self, id: EventId, user_id: &str) -> Result<RemoveOutcome> {
        self.inner.remove_participant(id, user_id).await
    }
}
