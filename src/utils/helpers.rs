//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application.

use std::time::Duration;

use chrono::{DateTime, DurationRound, Utc};
use rand::Rng;
use uuid::Uuid;

/// Generate a new event identifier
pub fn generate_event_id() -> Uuid {
    Uuid::new_v4()
}

/// Drop sub-microsecond precision, which PostgreSQL `TIMESTAMPTZ` cannot store
pub fn truncate_to_micros(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    timestamp
        .duration_trunc(chrono::Duration::microseconds(1))
        .unwrap_or(timestamp)
}

/// Current time at the precision the stores keep
pub fn current_timestamp() -> DateTime<Utc> {
    truncate_to_micros(Utc::now())
}

/// Trim a text field, treating blank input as missing
pub fn normalize_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Calculate pagination offset
pub fn calculate_offset(page: u32, page_size: u32) -> u64 {
    u64::from(page.saturating_sub(1)) * u64::from(page_size)
}

/// Escape `%`, `_` and `\` so user search text matches literally in LIKE patterns
pub fn escape_like_pattern(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Exponential backoff with full jitter for the given 1-based attempt
pub fn retry_backoff(base: Duration, attempt: u32) -> Duration {
    let base_ms = base.as_millis() as u64;
    if base_ms == 0 {
        return Duration::ZERO;
    }
    let ceiling = base_ms.saturating_mul(1u64 << attempt.saturating_sub(1).min(10));
    Duration::from_millis(rand::thread_rng().gen_range(base_ms / 2..=ceiling))
}
