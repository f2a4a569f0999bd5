//! Listing filters and pagination

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::event::{Event, EventCategory, EventId};
use crate::utils::errors::HelpingHandsError;

/// Store-level event filter; all set criteria must match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFilter {
    pub category: Option<EventCategory>,
    /// Case-insensitive substring match over title, description and location
    pub search: Option<String>,
    pub creator_id: Option<String>,
    pub participant_id: Option<String>,
    pub ids: Option<Vec<EventId>>,
    pub active_only: bool,
}

impl Default for EventFilter {
    fn default() -> Self {
        Self {
            category: None,
            search: None,
            creator_id: None,
            participant_id: None,
            ids: None,
            active_only: true,
        }
    }
}

impl EventFilter {
    /// Check an event against the filter in process
    pub fn matches(&self, event: &Event) -> bool {
        if self.active_only && !event.is_active {
            return false;
        }
        if let Some(category) = self.category {
            if event.category != category {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let found = [&event.title, &event.description, &event.location]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));
            if !found {
                return false;
            }
        }
        if let Some(creator_id) = &self.creator_id {
            if &event.creator.id != creator_id {
                return false;
            }
        }
        if let Some(participant_id) = &self.participant_id {
            if !event.has_participant(participant_id) {
                return false;
            }
        }
        if let Some(ids) = &self.ids {
            if !ids.contains(&event.id) {
                return false;
            }
        }
        true
    }
}

/// Primary sort key for event listings.
///
/// Every sort is ascending on its key, then newest-created first, then by id,
/// which keeps pagination stable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventSort {
    #[default]
    EventDate,
    CreatedAt,
    Title,
}

impl EventSort {
    pub fn column(&self) -> &'static str {
        match self {
            EventSort::EventDate => "event_date",
            EventSort::CreatedAt => "created_at",
            EventSort::Title => "title",
        }
    }

    /// `ORDER BY` expression for the primary key. Titles compare bytewise
    /// (`COLLATE "C"`) so the database agrees with [`EventSort::compare`].
    pub fn order_expression(&self) -> &'static str {
        match self {
            EventSort::Title => "title COLLATE \"C\"",
            _ => self.column(),
        }
    }

    /// Order two events the same way the database orders them
    pub fn compare(&self, a: &Event, b: &Event) -> std::cmp::Ordering {
        let primary = match self {
            EventSort::EventDate => a.event_date.cmp(&b.event_date),
            EventSort::CreatedAt => a.created_at.cmp(&b.created_at),
            EventSort::Title => a.title.cmp(&b.title),
        };
        primary
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| a.id.cmp(&b.id))
    }
}

impl FromStr for EventSort {
    type Err = HelpingHandsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "eventDate" | "event_date" => Ok(EventSort::EventDate),
            "createdAt" | "created_at" => Ok(EventSort::CreatedAt),
            "title" => Ok(EventSort::Title),
            other => Err(HelpingHandsError::Validation(format!("Unsupported sort field: {}", other))),
        }
    }
}

/// Public listing query: the filters a caller may set on `ListEvents`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventQuery {
    pub category: Option<EventCategory>,
    pub search: Option<String>,
    #[serde(default)]
    pub sort: EventSort,
}

/// Requested page; unset values fall back to configured defaults
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub current_page: u32,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, page: u32, limit: u32) -> Self {
        let total_pages = total.div_ceil(u64::from(limit.max(1)));
        Self {
            items,
            total,
            current_page: page,
            total_pages,
            has_next: u64::from(page) < total_pages,
            has_prev: page > 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_arithmetic() {
        let page: Page<u8> = Page::new(vec![], 25, 1, 12);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next);
        assert!(!page.has_prev);

        let page: Page<u8> = Page::new(vec![], 25, 3, 12);
        assert!(!page.has_next);
        assert!(page.has_prev);

        let page: Page<u8> = Page::new(vec![], 24, 2, 12);
        assert_eq!(page.total_pages, 2);
        assert!(!page.has_next);
    }

    #[test]
    fn test_empty_page() {
        let page: Page<u8> = Page::new(vec![], 0, 1, 12);
        assert_eq!(page.total_pages, 0);
        assert!(!page.has_next);
        assert!(!page.has_prev);
        assert!(page.is_empty());
    }

    #[test]
    fn test_sort_parsing() {
        assert_eq!("eventDate".parse::<EventSort>().unwrap(), EventSort::EventDate);
        assert_eq!("created_at".parse::<EventSort>().unwrap(), EventSort::CreatedAt);
        assert_eq!("title".parse::<EventSort>().unwrap(), EventSort::Title);
        assert!("participants; DROP TABLE events".parse::<EventSort>().is_err());
    }

    fn titled(title: &str) -> Event {
        let now = chrono::Utc::now();
        Event {
            id: uuid::Uuid::new_v4(),
            title: title.to_string(),
            description: String::new(),
            category: EventCategory::Other,
            thumbnail: String::new(),
            location: String::new(),
            event_date: now,
            creator: crate::models::Creator {
                id: "creator".to_string(),
                email: String::new(),
                display_name: String::new(),
                avatar_url: String::new(),
            },
            capacity: 0,
            participants: vec![],
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_title_sort_is_bytewise() {
        assert_eq!(EventSort::Title.order_expression(), "title COLLATE \"C\"");
        assert_eq!(EventSort::EventDate.order_expression(), "event_date");

        let (upper, lower) = (titled("Zebra crossing"), titled("apple picking"));
        assert_eq!(EventSort::Title.compare(&upper, &lower), std::cmp::Ordering::Less);
    }

    #[test]
    fn test_default_filter_is_active_only() {
        let filter = EventFilter::default();
        assert!(filter.active_only);
        assert!(filter.category.is_none());
    }
}
