//! Participation coordinator
//!
//! Implements the create, update, join and leave workflows across the event
//! store and the user store. The event store is the record of truth for
//! membership. The user's joined-event index is written second, only with
//! idempotent set operations, and a failure there is logged and reported but
//! never turns a committed join or leave into an error. Such drift is repaired
//! with [`ParticipationCoordinator::reconcile_user_index`].

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{PaginationConfig, ParticipationConfig, Settings};
use crate::database::store::{AppendOutcome, EventStore, RemoveOutcome, UserStore};
use crate::models::{
    CreateEventRequest, Creator, Event, EventFilter, EventId, EventQuery, EventSort, Identity, Page, PageRequest,
    Participant, UpdateEventRequest,
};
use crate::services::validation::{validate_create, validate_identity, validate_update};
use crate::utils::errors::{HelpingHandsError, Result};
use crate::utils::helpers::{calculate_offset, current_timestamp, generate_event_id, normalize_text, retry_backoff};
use crate::utils::logging::{log_event_action, log_index_desync, log_membership_change};

/// Result of a successful join
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinOutcome {
    pub event: Event,
    /// False when the event write committed but the user index could not be updated
    pub user_index_synced: bool,
}

/// Result of a leave, which succeeds even when the user was not a participant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveOutcome {
    pub was_participant: bool,
    pub user_index_synced: bool,
}

/// Changes made to a user's joined-event index by a repair
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub user_id: String,
    pub added: Vec<EventId>,
    pub removed: Vec<EventId>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
enum IndexOp {
    Add,
    Remove,
}

impl IndexOp {
    fn as_str(&self) -> &'static str {
        match self {
            IndexOp::Add => "add_joined_event",
            IndexOp::Remove => "remove_joined_event",
        }
    }
}

/// Coordinates membership changes between the event and user stores
#[derive(Clone)]
pub struct ParticipationCoordinator {
    events: Arc<dyn EventStore>,
    users: Arc<dyn UserStore>,
    participation: ParticipationConfig,
    pagination: PaginationConfig,
}

impl ParticipationCoordinator {
    pub fn new(events: Arc<dyn EventStore>, users: Arc<dyn UserStore>, settings: &Settings) -> Self {
        Self {
            events,
            users,
            participation: settings.participation.clone(),
            pagination: settings.pagination.clone(),
        }
    }

    /// Validate and persist a new event with an empty participant list
    pub async fn create_event(&self, request: CreateEventRequest, creator: &Identity) -> Result<Event> {
        validate_identity(creator)?;
        let now = current_timestamp();
        let validated = validate_create(request, now)?;

        let event = Event {
            id: generate_event_id(),
            title: validated.title,
            description: validated.description,
            category: validated.category,
            thumbnail: validated.thumbnail,
            location: validated.location,
            event_date: validated.event_date,
            creator: Creator::from(creator),
            capacity: validated.capacity,
            participants: Vec::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        self.events.create(&event).await?;
        log_event_action(event.id, "create", &creator.uid, Some(event.category.as_str()));

        Ok(event)
    }

    /// Apply creator-only changes to an event.
    ///
    /// Lowering the capacity below the current participant count is accepted
    /// and evicts nobody; it only blocks further joins.
    pub async fn update_event(&self, event_id: EventId, request: UpdateEventRequest, requester: &Identity) -> Result<Event> {
        let event = self
            .events
            .get_by_id(event_id)
            .await?
            .ok_or(HelpingHandsError::EventNotFound { event_id })?;

        if !event.is_created_by(&requester.uid) {
            warn!(event_id = %event_id, requester = %requester.uid, "Rejected update from non-creator");
            return Err(HelpingHandsError::Forbidden(format!(
                "Only the creator may update event {}",
                event_id
            )));
        }

        let changes = validate_update(request)?;
        if changes.is_empty() {
            debug!(event_id = %event_id, "Update carried no changes");
            return Ok(event);
        }

        let updated = self
            .events
            .update(event_id, &changes)
            .await?
            .ok_or(HelpingHandsError::EventNotFound { event_id })?;

        if !updated.is_unbounded() && updated.participant_count() > updated.capacity as usize {
            info!(
                event_id = %event_id,
                capacity = updated.capacity,
                participant_count = updated.participant_count(),
                "Capacity lowered below current participant count"
            );
        }
        log_event_action(event_id, "update", &requester.uid, None);

        Ok(updated)
    }

    /// Add the caller to an event's participants, then to their own index
    pub async fn join_event(&self, event_id: EventId, user: &Identity) -> Result<JoinOutcome> {
        validate_identity(user)?;
        let event = self.get_event(event_id).await?;
        let now = current_timestamp();

        if event.has_ended(now) {
            return Err(HelpingHandsError::EventEnded { event_id });
        }
        if event.has_participant(&user.uid) {
            return Err(HelpingHandsError::AlreadyJoined {
                event_id,
                user_id: user.uid.clone(),
            });
        }
        if event.is_full() {
            return Err(HelpingHandsError::EventFull {
                event_id,
                capacity: event.capacity,
            });
        }

        let participant = Participant::from_identity(user, now);
        let event = self.append_with_retry(event_id, &participant).await?;
        log_membership_change(event_id, &user.uid, "join", event.participant_count(), event.capacity);

        let user_index_synced = self.sync_user_index(IndexOp::Add, &user.uid, event_id).await;
        Ok(JoinOutcome {
            event,
            user_index_synced,
        })
    }

    /// Remove a user from an event's participants, then from their own index.
    ///
    /// Leaving an event the user is not part of, or one that does not
    /// exist, is a successful no-op on the event side; the index removal
    /// still runs so stale entries get cleared.
    pub async fn leave_event(&self, event_id: EventId, user_id: &str) -> Result<LeaveOutcome> {
        if user_id.trim().is_empty() {
            return Err(HelpingHandsError::Validation("user id is required".to_string()));
        }

        let was_participant = match self.events.remove_participant(event_id, user_id).await? {
            RemoveOutcome::Removed(event) => {
                log_membership_change(event_id, user_id, "leave", event.participant_count(), event.capacity);
                true
            }
            RemoveOutcome::NotMember(_) => {
                debug!(event_id = %event_id, user_id = user_id, "Leave for non-participant");
                false
            }
            RemoveOutcome::NotFound => {
                debug!(event_id = %event_id, user_id = user_id, "Leave for unknown event");
                false
            }
        };

        let user_index_synced = self.sync_user_index(IndexOp::Remove, user_id, event_id).await;
        Ok(LeaveOutcome {
            was_participant,
            user_index_synced,
        })
    }

    /// Fetch an active event
    pub async fn get_event(&self, event_id: EventId) -> Result<Event> {
        match self.events.get_by_id(event_id).await? {
            Some(event) if event.is_active => Ok(event),
            _ => Err(HelpingHandsError::EventNotFound { event_id }),
        }
    }

    /// Active events filtered by category and free text
    pub async fn list_events(&self, query: EventQuery, page: PageRequest) -> Result<Page<Event>> {
        let filter = EventFilter {
            category: query.category,
            search: normalize_text(query.search),
            ..Default::default()
        };
        self.find_page(&filter, query.sort, page).await
    }

    /// Active events created by a user
    pub async fn list_events_by_creator(&self, creator_id: &str, page: PageRequest) -> Result<Page<Event>> {
        let filter = EventFilter {
            creator_id: Some(creator_id.to_string()),
            ..Default::default()
        };
        self.find_page(&filter, EventSort::EventDate, page).await
    }

    /// Active events listed in a user's joined index, as a single page by date
    pub async fn list_events_joined_by_user(&self, user_id: &str) -> Result<Page<Event>> {
        let ids = self.users.get_joined_event_ids(user_id).await?;
        if ids.is_empty() {
            return Ok(Page::new(Vec::new(), 0, 1, self.pagination.default_limit));
        }

        let limit = ids.len() as u64;
        let filter = EventFilter {
            ids: Some(ids),
            ..Default::default()
        };
        let (events, total) = self.events.find(&filter, EventSort::EventDate, 0, limit).await?;
        let page_size = u32::try_from(total).unwrap_or(u32::MAX).max(1);

        Ok(Page::new(events, total, 1, page_size))
    }

    /// Rebuild a user's joined index from the event store.
    ///
    /// Uses only set-add and set-remove, so it is safe to run repeatedly
    /// and concurrently with joins and leaves.
    pub async fn reconcile_user_index(&self, user_id: &str) -> Result<ReconcileReport> {
        let filter = EventFilter {
            participant_id: Some(user_id.to_string()),
            active_only: false,
            ..Default::default()
        };
        let (events, _) = self.events.find(&filter, EventSort::CreatedAt, 0, u64::MAX).await?;
        let desired: BTreeSet<EventId> = events.iter().map(|event| event.id).collect();
        let current: BTreeSet<EventId> = self.users.get_joined_event_ids(user_id).await?.into_iter().collect();

        let mut report = ReconcileReport {
            user_id: user_id.to_string(),
            ..Default::default()
        };
        for event_id in desired.difference(&current) {
            self.users.add_joined_event(user_id, *event_id).await?;
            report.added.push(*event_id);
        }
        for event_id in current.difference(&desired) {
            self.users.remove_joined_event(user_id, *event_id).await?;
            report.removed.push(*event_id);
        }

        if report.is_clean() {
            debug!(user_id = user_id, "User index already consistent");
        } else {
            info!(
                user_id = user_id,
                added = report.added.len(),
                removed = report.removed.len(),
                "User index repaired"
            );
        }
        Ok(report)
    }

    async fn find_page(&self, filter: &EventFilter, sort: EventSort, request: PageRequest) -> Result<Page<Event>> {
        let (page, limit) = self.resolve_page(request)?;
        let (events, total) = self
            .events
            .find(filter, sort, calculate_offset(page, limit), u64::from(limit))
            .await?;

        Ok(Page::new(events, total, page, limit))
    }

    fn resolve_page(&self, request: PageRequest) -> Result<(u32, u32)> {
        let page = request.page.unwrap_or(1);
        let limit = request.limit.unwrap_or(self.pagination.default_limit);

        if page < 1 {
            return Err(HelpingHandsError::Validation("page must be at least 1".to_string()));
        }
        if limit < 1 || limit > self.pagination.max_limit {
            return Err(HelpingHandsError::Validation(format!(
                "limit must be between 1 and {}",
                self.pagination.max_limit
            )));
        }
        Ok((page, limit))
    }

    /// Atomic append, retried while the store reports a lost race
    async fn append_with_retry(&self, event_id: EventId, participant: &Participant) -> Result<Event> {
        let attempts = self.participation.max_join_attempts.max(1);
        let mut last_conflict = String::new();

        for attempt in 1..=attempts {
            match self.events.append_participant(event_id, participant).await {
                Ok(AppendOutcome::Appended(event)) => return Ok(event),
                Ok(AppendOutcome::AlreadyMember) => {
                    return Err(HelpingHandsError::AlreadyJoined {
                        event_id,
                        user_id: participant.user_id.clone(),
                    })
                }
                Ok(AppendOutcome::Full { capacity }) => {
                    return Err(HelpingHandsError::EventFull { event_id, capacity })
                }
                Ok(AppendOutcome::NotFound) | Ok(AppendOutcome::NotActive) => {
                    return Err(HelpingHandsError::EventNotFound { event_id })
                }
                Err(HelpingHandsError::Conflict(reason)) => {
                    warn!(
                        event_id = %event_id,
                        user_id = %participant.user_id,
                        attempt = attempt,
                        reason = %reason,
                        "Join lost a concurrent update"
                    );
                    last_conflict = reason;
                    if attempt < attempts {
                        tokio::time::sleep(retry_backoff(self.participation.index_retry_backoff(), attempt)).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Err(HelpingHandsError::Conflict(format!(
            "join of event {} failed after {} attempts: {}",
            event_id, attempts, last_conflict
        )))
    }

    /// Best-effort index write; returns whether it landed
    async fn sync_user_index(&self, op: IndexOp, user_id: &str, event_id: EventId) -> bool {
        let attempts = self.participation.index_sync_attempts.max(1);

        for attempt in 1..=attempts {
            let result = match op {
                IndexOp::Add => self.users.add_joined_event(user_id, event_id).await,
                IndexOp::Remove => self.users.remove_joined_event(user_id, event_id).await,
            };

            match result {
                Ok(()) => return true,
                Err(e) if e.is_retryable() && attempt < attempts => {
                    warn!(
                        event_id = %event_id,
                        user_id = user_id,
                        action = op.as_str(),
                        attempt = attempt,
                        error = %e,
                        "User index write failed, retrying"
                    );
                    tokio::time::sleep(retry_backoff(self.participation.index_retry_backoff(), attempt)).await;
                }
                Err(e) => {
                    log_index_desync(event_id, user_id, op.as_str(), &e);
                    return false;
                }
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{InMemoryEventStore, InMemoryUserStore};
    use assert_matches::assert_matches;
    use chrono::{Duration, Utc};

    fn coordinator() -> (ParticipationCoordinator, InMemoryEventStore, InMemoryUserStore) {
        let events = InMemoryEventStore::new();
        let users = InMemoryUserStore::new();
        let coordinator = ParticipationCoordinator::new(
            Arc::new(events.clone()),
            Arc::new(users.clone()),
            &Settings::default(),
        );
        (coordinator, events, users)
    }

    fn request(capacity: i64) -> CreateEventRequest {
        CreateEventRequest {
            title: Some("Food drive".to_string()),
            description: Some("Collecting canned food".to_string()),
            category: Some("Donation".to_string()),
            thumbnail: Some("https://img/food.png".to_string()),
            location: Some("Community hall".to_string()),
            event_date: Some(Utc::now() + Duration::days(1)),
            capacity: Some(capacity),
        }
    }

    fn user(uid: &str) -> Identity {
        Identity::new(uid, format!("{uid}@example.com"), uid.to_uppercase())
    }

    #[tokio::test]
    async fn test_join_writes_event_then_index() {
        let (coordinator, _, users) = coordinator();
        let event = coordinator.create_event(request(0), &user("creator")).await.unwrap();

        let outcome = coordinator.join_event(event.id, &user("a")).await.unwrap();
        assert!(outcome.user_index_synced);
        assert_eq!(outcome.event.participant_count(), 1);
        assert_eq!(users.get_joined_event_ids("a").await.unwrap(), vec![event.id]);
    }

    #[tokio::test]
    async fn test_empty_update_returns_event_unchanged() {
        let (coordinator, _, _) = coordinator();
        let event = coordinator.create_event(request(3), &user("creator")).await.unwrap();

        let same = coordinator
            .update_event(event.id, UpdateEventRequest::default(), &user("creator"))
            .await
            .unwrap();
        assert_eq!(same, event);
    }

    #[tokio::test]
    async fn test_page_bounds_are_validated() {
        let (coordinator, _, _) = coordinator();
        assert_matches!(
            coordinator.list_events(EventQuery::default(), PageRequest::new(0, 10)).await,
            Err(HelpingHandsError::Validation(_))
        );
        assert_matches!(
            coordinator.list_events(EventQuery::default(), PageRequest::new(1, 1000)).await,
            Err(HelpingHandsError::Validation(_))
        );
    }

    #[tokio::test]
    async fn test_reconcile_on_consistent_index_is_clean() {
        let (coordinator, _, _) = coordinator();
        let event = coordinator.create_event(request(0), &user("creator")).await.unwrap();
        coordinator.join_event(event.id, &user("a")).await.unwrap();

        let report = coordinator.reconcile_user_index("a").await.unwrap();
        assert!(report.is_clean());
    }
}
