//! Test data helpers for creating identities and event requests

use chrono::{DateTime, Duration, Utc};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;

use HelpingHands::models::{CreateEventRequest, Identity};
use HelpingHands::utils::helpers::truncate_to_micros;

/// Identity with the given uid and generated contact details
pub fn test_identity(uid: &str) -> Identity {
    let email: String = SafeEmail().fake();
    let name: String = Name().fake();
    Identity::new(uid, email, name)
}

pub fn tomorrow() -> DateTime<Utc> {
    truncate_to_micros(Utc::now() + Duration::days(1))
}

/// A valid creation request for an event a day from now
pub fn event_request(title: &str, capacity: i64) -> CreateEventRequest {
    event_request_on(title, capacity, tomorrow())
}

pub fn event_request_on(title: &str, capacity: i64, event_date: DateTime<Utc>) -> CreateEventRequest {
    CreateEventRequest {
        title: Some(title.to_string()),
        description: Some(format!("{} for the neighbourhood", title)),
        category: Some("Cleanup".to_string()),
        thumbnail: Some("https://images.example.com/event.png".to_string()),
        location: Some("Riverside park".to_string()),
        event_date: Some(event_date),
        capacity: Some(capacity),
    }
}
