//! User model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::models::event::{Event, EventId};

/// Caller identity as asserted by the upstream identity provider.
///
/// The fields are trusted as given; only identity equality is used for
/// authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
    pub email: String,
    pub display_name: String,
    #[serde(default)]
    pub photo_url: String,
}

impl Identity {
    pub fn new(uid: impl Into<String>, email: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
            display_name: display_name.into(),
            photo_url: String::new(),
        }
    }

    pub fn with_photo_url(mut self, photo_url: impl Into<String>) -> Self {
        self.photo_url = photo_url.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: String,
    pub email: String,
    pub display_name: String,
    pub avatar_url: String,
    /// Denormalized index of joined events; events hold the authoritative list
    pub joined_event_ids: Vec<EventId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile together with the active events it has joined
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileView {
    pub profile: UserProfile,
    pub joined_events: Vec<Event>,
}
