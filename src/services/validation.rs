//! Request validation
//!
//! Turns raw create/update input into validated values. Every failure is a
//! `HelpingHandsError::Validation` naming the offending field.

use chrono::{DateTime, Utc};

use crate::models::event::{
    CreateEventRequest, EventCategory, EventChanges, UpdateEventRequest, MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH,
};
use crate::models::user::Identity;
use crate::utils::errors::{HelpingHandsError, Result};
use crate::utils::helpers::{normalize_text, truncate_to_micros};

/// Creation input after validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedEvent {
    pub title: String,
    pub description: String,
    pub category: EventCategory,
    pub thumbnail: String,
    pub location: String,
    pub event_date: DateTime<Utc>,
    pub capacity: u32,
}

fn required(field: &str, value: Option<String>) -> Result<String> {
    normalize_text(value).ok_or_else(|| HelpingHandsError::Validation(format!("{} is required", field)))
}

fn within_length(field: &str, value: String, max: usize) -> Result<String> {
    if value.chars().count() > max {
        return Err(HelpingHandsError::Validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(value)
}

fn capacity(value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        HelpingHandsError::Validation(format!("capacity must be a non-negative integer, got {}", value))
    })
}

fn non_blank(field: &str, value: Option<String>) -> Result<Option<String>> {
    match value {
        None => Ok(None),
        Some(raw) => required(field, Some(raw)).map(Some),
    }
}

/// The identity fields every stored record depends on
pub fn validate_identity(identity: &Identity) -> Result<()> {
    if identity.uid.trim().is_empty() {
        return Err(HelpingHandsError::Validation("user id is required".to_string()));
    }
    if identity.email.trim().is_empty() {
        return Err(HelpingHandsError::Validation("user email is required".to_string()));
    }
    if identity.display_name.trim().is_empty() {
        return Err(HelpingHandsError::Validation("user display name is required".to_string()));
    }
    Ok(())
}

pub fn validate_create(request: CreateEventRequest, now: DateTime<Utc>) -> Result<ValidatedEvent> {
    let title = within_length("title", required("title", request.title)?, MAX_TITLE_LENGTH)?;
    let description = within_length(
        "description",
        required("description", request.description)?,
        MAX_DESCRIPTION_LENGTH,
    )?;
    let category = required("category", request.category)?.parse::<EventCategory>()?;
    let location = required("location", request.location)?;
    let event_date = request
        .event_date
        .map(truncate_to_micros)
        .ok_or_else(|| HelpingHandsError::Validation("event date is required".to_string()))?;
    if event_date <= now {
        return Err(HelpingHandsError::Validation("event date must be in the future".to_string()));
    }

    Ok(ValidatedEvent {
        title,
        description,
        category,
        thumbnail: normalize_text(request.thumbnail).unwrap_or_default(),
        location,
        event_date,
        capacity: request.capacity.map(capacity).transpose()?.unwrap_or(0),
    })
}

/// Validate the allow-listed update fields; absent fields stay untouched
pub fn validate_update(request: UpdateEventRequest) -> Result<EventChanges> {
    let title = non_blank("title", request.title)?
        .map(|title| within_length("title", title, MAX_TITLE_LENGTH))
        .transpose()?;
    let description = non_blank("description", request.description)?
        .map(|description| within_length("description", description, MAX_DESCRIPTION_LENGTH))
        .transpose()?;
    let category = non_blank("category", request.category)?
        .map(|category| category.parse::<EventCategory>())
        .transpose()?;
    let location = non_blank("location", request.location)?;

    Ok(EventChanges {
        title,
        description,
        category,
        // an empty thumbnail clears it
        thumbnail: request.thumbnail.map(|t| t.trim().to_string()),
        location,
        event_date: request.event_date.map(truncate_to_micros),
        capacity: request.capacity.map(capacity).transpose()?,
    })
}
