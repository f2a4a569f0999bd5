//! Event model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::Identity;
use crate::utils::errors::HelpingHandsError;

/// Opaque event identifier, assigned at creation
pub type EventId = Uuid;

pub const MAX_TITLE_LENGTH: usize = 100;
pub const MAX_DESCRIPTION_LENGTH: usize = 2000;

/// Kind of volunteering activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_category")]
pub enum EventCategory {
    Cleanup,
    Plantation,
    Donation,
    Education,
    Healthcare,
    Other,
}

impl EventCategory {
    pub const ALL: [EventCategory; 6] = [
        EventCategory::Cleanup,
        EventCategory::Plantation,
        EventCategory::Donation,
        EventCategory::Education,
        EventCategory::Healthcare,
        EventCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Cleanup => "Cleanup",
            EventCategory::Plantation => "Plantation",
            EventCategory::Donation => "Donation",
            EventCategory::Education => "Education",
            EventCategory::Healthcare => "Healthcare",
            EventCategory::Other => "Other",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventCategory {
    type Err = HelpingHandsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        EventCategory::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| HelpingHandsError::Validation(format!("Unknown event category: {}", value)))
    }
}

/// Snapshot of the creator's identity taken when the event was created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub avatar_url: String,
}

impl From<&Identity> for Creator {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.uid.clone(),
            email: identity.email.clone(),
            display_name: identity.display_name.clone(),
            avatar_url: identity.photo_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub user_id: String,
    pub email: String,
    pub display_name: String,
    pub avatar_url: String,
    pub joined_at: DateTime<Utc>,
}

impl Participant {
    pub fn from_identity(identity: &Identity, joined_at: DateTime<Utc>) -> Self {
        Self {
            user_id: identity.uid.clone(),
            email: identity.email.clone(),
            display_name: identity.display_name.clone(),
            avatar_url: identity.photo_url.clone(),
            joined_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub description: String,
    pub category: EventCategory,
    pub thumbnail: String,
    pub location: String,
    pub event_date: DateTime<Utc>,
    pub creator: Creator,
    /// Maximum number of participants, 0 means unbounded
    pub capacity: u32,
    pub participants: Vec<Participant>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn has_participant(&self, user_id: &str) -> bool {
        self.participants.iter().any(|p| p.user_id == user_id)
    }

    pub fn is_unbounded(&self) -> bool {
        self.capacity == 0
    }

    /// No free slot left for a new participant
    pub fn is_full(&self) -> bool {
        !self.is_unbounded() && self.participant_count() >= self.capacity as usize
    }

    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        self.event_date <= now
    }

    pub fn is_created_by(&self, user_id: &str) -> bool {
        self.creator.id == user_id
    }
}

/// Raw creation input as received from the calling layer.
///
/// Every field is optional so that missing values surface as validation
/// errors instead of deserialization failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub thumbnail: Option<String>,
    pub location: Option<String>,
    pub event_date: Option<DateTime<Utc>>,
    pub capacity: Option<i64>,
}

/// Raw update input; only the allow-listed mutable fields exist here
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub thumbnail: Option<String>,
    pub location: Option<String>,
    pub event_date: Option<DateTime<Utc>>,
    pub capacity: Option<i64>,
}

/// Validated partial update handed to the event store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<EventCategory>,
    pub thumbnail: Option<String>,
    pub location: Option<String>,
    pub event_date: Option<DateTime<Utc>>,
    pub capacity: Option<u32>,
}

impl EventChanges {
    pub fn is_empty(&self) -> bool {
        *self == EventChanges::default()
    }

    /// Apply the changes to an in-memory event, bumping `updated_at`
    pub fn apply_to(&self, event: &mut Event, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            event.title = title.clone();
        }
        if let Some(description) = &self.description {
            event.description = description.clone();
        }
        if let Some(category) = self.category {
            event.category = category;
        }
        if let Some(thumbnail) = &self.thumbnail {
            event.thumbnail = thumbnail.clone();
        }
        if let Some(location) = &self.location {
            event.location = location.clone();
        }
        if let Some(event_date) = self.event_date {
            event.event_date = event_date;
        }
        if let Some(capacity) = self.capacity {
            event.capacity = capacity;
        }
        event.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_event(capacity: u32) -> Event {
        let now = Utc::now();
        Event {
            id: Uuid::new_v4(),
            title: "Beach cleanup".to_string(),
            description: "Bring gloves".to_string(),
            category: EventCategory::Cleanup,
            thumbnail: String::new(),
            location: "North beach".to_string(),
            event_date: now + Duration::days(1),
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

    #[test]
    fn test_category_parsing() {
        assert_eq!("Cleanup".parse::<EventCategory>().unwrap(), EventCategory::Cleanup);
        assert_eq!(" healthcare ".parse::<EventCategory>().unwrap(), EventCategory::Healthcare);
        assert!("Party".parse::<EventCategory>().is_err());
        for category in EventCategory::ALL {
            assert_eq!(category.to_string().parse::<EventCategory>().unwrap(), category);
        }
    }

    #[test]
    fn test_capacity_checks() {
        let identity = Identity::new("u1", "u1@example.com", "User One");
        let mut event = sample_event(1);
        assert!(!event.is_full());

        event.participants.push(Participant::from_identity(&identity, Utc::now()));
        assert!(event.is_full());
        assert!(event.has_participant("u1"));

        event.capacity = 0;
        assert!(event.is_unbounded());
        assert!(!event.is_full());
    }

    #[test]
    fn test_has_ended() {
        let event = sample_event(0);
        assert!(!event.has_ended(Utc::now()));
        assert!(event.has_ended(event.event_date));
        assert!(event.has_ended(event.event_date + Duration::seconds(1)));
    }

    #[test]
    fn test_changes_apply_only_given_fields() {
        let mut event = sample_event(5);
        let original = event.clone();
        let changes = EventChanges {
            title: Some("River cleanup".to_string()),
            capacity: Some(2),
            ..Default::default()
        };
        let now = Utc::now() + Duration::minutes(1);
        changes.apply_to(&mut event, now);

        assert_eq!(event.title, "River cleanup");
        assert_eq!(event.capacity, 2);
        assert_eq!(event.description, original.description);
        assert_eq!(event.location, original.location);
        assert_eq!(event.updated_at, now);
        assert!(EventChanges::default().is_empty());
        assert!(!changes.is_empty());
    }
}
