//! In-memory store implementations
//!
//! Provide the same contracts and atomicity as the PostgreSQL repositories
//! without a database:
//! - [`InMemoryEventStore`]: events keyed by id, each admission decided under
//!   one write lock
//! - [`InMemoryUserStore`]: profiles plus the joined-event index

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::database::store::{AppendOutcome, EventStore, RemoveOutcome, UserStore};
use crate::models::{Event, EventChanges, EventFilter, EventId, EventSort, Identity, Participant, UserProfile};
use crate::utils::errors::{HelpingHandsError, Result};
use crate::utils::helpers::current_timestamp;

#[derive(Clone, Debug, Default)]
pub struct InMemoryEventStore {
    events: Arc<RwLock<HashMap<EventId, Event>>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored events, active or not
    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn create(&self, event: &Event) -> Result<EventId> {
        let mut events = self.events.write().await;
        if events.contains_key(&event.id) {
            return Err(HelpingHandsError::Conflict(format!("Event {} already exists", event.id)));
        }
        events.insert(event.id, event.clone());
        Ok(event.id)
    }

    async fn get_by_id(&self, id: EventId) -> Result<Option<Event>> {
        Ok(self.events.read().await.get(&id).cloned())
    }

    async fn find(&self, filter: &EventFilter, sort: EventSort, offset: u64, limit: u64) -> Result<(Vec<Event>, u64)> {
        let mut matching: Vec<Event> = self
            .events
            .read()
            .await
            .values()
            .filter(|event| filter.matches(event))
            .cloned()
            .collect();
        matching.sort_by(|a, b| sort.compare(a, b));

        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect();

        Ok((page, total))
    }

    async fn update(&self, id: EventId, changes: &EventChanges) -> Result<Option<Event>> {
        let mut events = self.events.write().await;
        Ok(events.get_mut(&id).map(|event| {
            changes.apply_to(event, current_timestamp());
            event.clone()
        }))
    }

    async fn append_participant(&self, id: EventId, participant: &Participant) -> Result<AppendOutcome> {
        let mut events = self.events.write().await;
        let Some(event) = events.get_mut(&id) else {
            return Ok(AppendOutcome::NotFound);
        };

        if !event.is_active {
            return Ok(AppendOutcome::NotActive);
        }
        if event.has_participant(&participant.user_id) {
            return Ok(AppendOutcome::AlreadyMember);
        }
        if event.is_full() {
            return Ok(AppendOutcome::Full { capacity: event.capacity });
        }

        event.participants.push(participant.clone());
        event.updated_at = current_timestamp();
        Ok(AppendOutcome::Appended(event.clone()))
    }

    async fn remove_participant(&self, id: EventId, user_id: &str) -> Result<RemoveOutcome> {
        let mut events = self.events.write().await;
        let Some(event) = events.get_mut(&id) else {
            return Ok(RemoveOutcome::NotFound);
        };

        let before = event.participants.len();
        event.participants.retain(|p| p.user_id != user_id);
        if event.participants.len() == before {
            return Ok(RemoveOutcome::NotMember(event.clone()));
        }

        event.updated_at = current_timestamp();
        Ok(RemoveOutcome::Removed(event.clone()))
    }
}

#[derive(Debug, Default)]
struct UserState {
    profiles: HashMap<String, UserProfile>,
    // kept apart from profiles: the index may hold ids for users never synced
    joined: HashMap<String, Vec<EventId>>,
}

#[derive(Clone, Debug, Default)]
pub struct InMemoryUserStore {
    state: Arc<RwLock<UserState>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn upsert_profile(&self, identity: &Identity) -> Result<UserProfile> {
        let mut state = self.state.write().await;
        let now = current_timestamp();
        let joined_event_ids = state.joined.get(&identity.uid).cloned().unwrap_or_default();

        let profile = state
            .profiles
            .entry(identity.uid.clone())
            .and_modify(|profile| {
                profile.email = identity.email.clone();
                profile.display_name = identity.display_name.clone();
                if !identity.photo_url.is_empty() {
                    profile.avatar_url = identity.photo_url.clone();
                }
                profile.updated_at = now;
            })
            .or_insert_with(|| UserProfile {
                uid: identity.uid.clone(),
                email: identity.email.clone(),
                display_name: identity.display_name.clone(),
                avatar_url: identity.photo_url.clone(),
                joined_event_ids: Vec::new(),
                created_at: now,
                updated_at: now,
            });

        let mut profile = profile.clone();
        profile.joined_event_ids = joined_event_ids;
        Ok(profile)
    }

    async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>> {
        let state = self.state.read().await;
        Ok(state.profiles.get(uid).map(|profile| {
            let mut profile = profile.clone();
            profile.joined_event_ids = state.joined.get(uid).cloned().unwrap_or_default();
            profile
        }))
    }

    async fn add_joined_event(&self, uid: &str, event_id: EventId) -> Result<()> {
        let mut state = self.state.write().await;
        let joined = state.joined.entry(uid.to_string()).or_default();
        if !joined.contains(&event_id) {
            joined.push(event_id);
        }
        Ok(())
    }

    async fn remove_joined_event(&self, uid: &str, event_id: EventId) -> Result<()> {
        let mut state = self.state.write().await;
        if let Some(joined) = state.joined.get_mut(uid) {
            joined.retain(|id| *id != event_id);
        }
        Ok(())
    }

    async fn get_joined_event_ids(&self, uid: &str) -> Result<Vec<EventId>> {
        Ok(self.state.read().await.joined.get(uid).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Creator, EventCategory};
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn event(capacity: u32) -> Event {
        let now = Utc::now();
        Event {
            id: Uuid::new_v4(),
            title: "Tree planting".to_string(),
            description: "Saplings provided".to_string(),
            category: EventCategory::Plantation,
            thumbnail: String::new(),
            location: "City park".to_string(),
            event_date: now + Duration::days(3),
            creator: Creator {
                id: "creator".to_string(),
                email: "creator@example.com".to_string(),
                display_name: "Creator".to_string(),
                avatar_url: String::new(),
            },
            capacity,
            participants: vec![],
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn participant(uid: &str) -> Participant {
        Participant::from_identity(&Identity::new(uid, format!("{uid}@example.com"), uid), Utc::now())
    }

    #[tokio::test]
    async fn test_append_enforces_duplicates_and_capacity() {
        let store = InMemoryEventStore::new();
        let id = store.create(&event(1)).await.unwrap();

        assert!(matches!(store.append_participant(id, &participant("a")).await.unwrap(), AppendOutcome::Appended(e) if e.participant_count() == 1));
        assert_eq!(store.append_participant(id, &participant("a")).await.unwrap(), AppendOutcome::AlreadyMember);
        assert_eq!(store.append_participant(id, &participant("b")).await.unwrap(), AppendOutcome::Full { capacity: 1 });
        assert_eq!(store.append_participant(Uuid::new_v4(), &participant("b")).await.unwrap(), AppendOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_append_to_inactive_event() {
        let store = InMemoryEventStore::new();
        let mut inactive = event(0);
        inactive.is_active = false;
        let id = store.create(&inactive).await.unwrap();

        assert_eq!(store.append_participant(id, &participant("a")).await.unwrap(), AppendOutcome::NotActive);
    }

    #[tokio::test]
    async fn test_remove_participant_outcomes() {
        let store = InMemoryEventStore::new();
        let id = store.create(&event(0)).await.unwrap();
        store.append_participant(id, &participant("a")).await.unwrap();

        assert!(matches!(store.remove_participant(id, "b").await.unwrap(), RemoveOutcome::NotMember(_)));
        assert!(matches!(store.remove_participant(id, "a").await.unwrap(), RemoveOutcome::Removed(e) if e.participants.is_empty()));
        assert_eq!(store.remove_participant(Uuid::new_v4(), "a").await.unwrap(), RemoveOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_find_paginates_in_date_order() {
        let store = InMemoryEventStore::new();
        for days in [5, 1, 3] {
            let mut e = event(0);
            e.event_date = Utc::now() + Duration::days(days);
            store.create(&e).await.unwrap();
        }

        let (page, total) = store.find(&EventFilter::default(), EventSort::EventDate, 0, 2).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(page.len(), 2);
        assert!(page[0].event_date < page[1].event_date);

        let (rest, _) = store.find(&EventFilter::default(), EventSort::EventDate, 2, 2).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert!(rest[0].event_date > page[1].event_date);
    }

    #[tokio::test]
    async fn test_joined_index_is_a_set() {
        let store = InMemoryUserStore::new();
        let event_id = Uuid::new_v4();

        store.add_joined_event("a", event_id).await.unwrap();
        store.add_joined_event("a", event_id).await.unwrap();
        assert_eq!(store.get_joined_event_ids("a").await.unwrap(), vec![event_id]);

        store.remove_joined_event("a", event_id).await.unwrap();
        store.remove_joined_event("a", event_id).await.unwrap();
        assert!(store.get_joined_event_ids("a").await.unwrap().is_empty());
        assert!(store.get_joined_event_ids("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_keeps_avatar_when_missing() {
        let store = InMemoryUserStore::new();
        let identity = Identity::new("a", "a@example.com", "Ann").with_photo_url("https://img/a.png");
        store.upsert_profile(&identity).await.unwrap();

        let renamed = Identity::new("a", "ann@example.com", "Ann B");
        let profile = store.upsert_profile(&renamed).await.unwrap();
        assert_eq!(profile.display_name, "Ann B");
        assert_eq!(profile.email, "ann@example.com");
        assert_eq!(profile.avatar_url, "https://img/a.png");
    }
}
