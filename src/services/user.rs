//! Profile service implementation
//!
//! Keeps the user's profile in step with the identity provider and assembles
//! the profile view with the events the user has joined.

use std::sync::Arc;

use tracing::{debug, info};

use crate::database::store::{EventStore, UserStore};
use crate::models::{EventFilter, EventSort, Identity, ProfileView, UserProfile};
use crate::services::validation::validate_identity;
use crate::utils::errors::{HelpingHandsError, Result};

/// Profile service for managing user records
#[derive(Clone)]
pub struct ProfileService {
    events: Arc<dyn EventStore>,
    users: Arc<dyn UserStore>,
}

impl ProfileService {
    pub fn new(events: Arc<dyn EventStore>, users: Arc<dyn UserStore>) -> Self {
        Self { events, users }
    }

    /// Create the profile on first sign-in, refresh it afterwards.
    ///
    /// The joined-event index is never touched here.
    pub async fn sync_profile(&self, identity: &Identity) -> Result<UserProfile> {
        validate_identity(identity)?;
        let profile = self.users.upsert_profile(identity).await?;
        info!(user_id = %profile.uid, "User profile synced");
        Ok(profile)
    }

    /// Profile plus its joined events that are still active, earliest first
    pub async fn get_profile(&self, uid: &str) -> Result<ProfileView> {
        debug!(user_id = uid, "Loading user profile");
        let profile = self
            .users
            .get_profile(uid)
            .await?
            .ok_or_else(|| HelpingHandsError::UserNotFound { user_id: uid.to_string() })?;

        if profile.joined_event_ids.is_empty() {
            return Ok(ProfileView {
                profile,
                joined_events: Vec::new(),
            });
        }

        let filter = EventFilter {
            ids: Some(profile.joined_event_ids.clone()),
            ..Default::default()
        };
        let limit = profile.joined_event_ids.len() as u64;
        let (joined_events, _) = self.events.find(&filter, EventSort::EventDate, 0, limit).await?;

        Ok(ProfileView { profile, joined_events })
    }
}
