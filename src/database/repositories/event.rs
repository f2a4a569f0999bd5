//! Event repository implementation

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::store::{AppendOutcome, EventStore, RemoveOutcome};
use crate::models::event::{Creator, Event, EventCategory, EventChanges, EventId, Participant};
use crate::models::query::{EventFilter, EventSort};
use crate::utils::errors::{HelpingHandsError, Result};
use crate::utils::helpers::{current_timestamp, escape_like_pattern};
use crate::utils::logging::log_store_operation;

const EVENT_COLUMNS: &str = "id, title, description, category, thumbnail, location, event_date, \
     creator_id, creator_email, creator_display_name, creator_avatar_url, \
     capacity, is_active, created_at, updated_at";

const PARTICIPANT_COLUMNS: &str = "event_id, user_id, email, display_name, avatar_url, joined_at";

#[derive(Debug, FromRow)]
struct EventRow {
    id: Uuid,
    title: String,
    description: String,
    category: EventCategory,
    thumbnail: String,
    location: String,
    event_date: DateTime<Utc>,
    creator_id: String,
    creator_email: String,
    creator_display_name: String,
    creator_avatar_url: String,
    capacity: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl EventRow {
    fn into_event(self, participants: Vec<Participant>) -> Result<Event> {
        let capacity = u32::try_from(self.capacity)
            .map_err(|e| HelpingHandsError::Database(sqlx::Error::Decode(Box::new(e))))?;

        Ok(Event {
            id: self.id,
            title: self.title,
            description: self.description,
            category: self.category,
            thumbnail: self.thumbnail,
            location: self.location,
            event_date: self.event_date,
            creator: Creator {
                id: self.creator_id,
                email: self.creator_email,
                display_name: self.creator_display_name,
                avatar_url: self.creator_avatar_url,
            },
            capacity,
            participants,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ParticipantRow {
    event_id: Uuid,
    user_id: String,
    email: String,
    display_name: String,
    avatar_url: String,
    joined_at: DateTime<Utc>,
}

impl From<ParticipantRow> for Participant {
    fn from(row: ParticipantRow) -> Self {
        Self {
            user_id: row.user_id,
            email: row.email,
            display_name: row.display_name,
            avatar_url: row.avatar_url,
            joined_at: row.joined_at,
        }
    }
}

#[derive(Clone, Debug)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Participants of the given events, grouped by event and in join order
    async fn load_participants(&self, event_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<Participant>>> {
        if event_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let sql = format!(
            "SELECT {} FROM event_participants WHERE event_id = ANY($1) ORDER BY position ASC",
            PARTICIPANT_COLUMNS
        );
        let rows = sqlx::query_as::<_, ParticipantRow>(&sql)
            .bind(event_ids)
            .fetch_all(&self.pool)
            .await?;

        let mut grouped: HashMap<Uuid, Vec<Participant>> = HashMap::new();
        for row in rows {
            grouped.entry(row.event_id).or_default().push(row.into());
        }
        Ok(grouped)
    }

    async fn assemble(&self, rows: Vec<EventRow>) -> Result<Vec<Event>> {
        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let mut participants = self.load_participants(&ids).await?;

        rows.into_iter()
            .map(|row| {
                let list = participants.remove(&row.id).unwrap_or_default();
                row.into_event(list)
            })
            .collect()
    }

    /// Count events matching a filter
    pub async fn count(&self, filter: &EventFilter) -> Result<u64> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM events");
        push_filter(&mut query, filter);
        let (count,): (i64,) = query.build_query_as().fetch_one(&self.pool).await?;

        Ok(u64::try_from(count).unwrap_or(0))
    }
}

/// Append the WHERE clause for a filter; all user input goes through binds
fn push_filter(query: &mut QueryBuilder<'_, Postgres>, filter: &EventFilter) {
    query.push(" WHERE TRUE");

    if filter.active_only {
        query.push(" AND is_active = TRUE");
    }
    if let Some(category) = filter.category {
        query.push(" AND category = ").push_bind(category);
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", escape_like_pattern(search));
        query
            .push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR location ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(creator_id) = &filter.creator_id {
        query.push(" AND creator_id = ").push_bind(creator_id.clone());
    }
    if let Some(participant_id) = &filter.participant_id {
        query
            .push(" AND EXISTS (SELECT 1 FROM event_participants p WHERE p.event_id = events.id AND p.user_id = ")
            .push_bind(participant_id.clone())
            .push(")");
    }
    if let Some(ids) = &filter.ids {
        query.push(" AND id = ANY(").push_bind(ids.clone()).push(")");
    }
}

#[async_trait]
impl EventStore for EventRepository {
    /// Create a new event
    async fn create(&self, event: &Event) -> Result<EventId> {
        let mut tx = self.pool.begin().await?;

        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO events (id, title, description, category, thumbnail, location, event_date,
                                creator_id, creator_email, creator_display_name, creator_avatar_url,
                                capacity, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING id
            "#
        )
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.category)
        .bind(&event.thumbnail)
        .bind(&event.location)
        .bind(event.event_date)
        .bind(&event.creator.id)
        .bind(&event.creator.email)
        .bind(&event.creator.display_name)
        .bind(&event.creator.avatar_url)
        .bind(i64::from(event.capacity))
        .bind(event.is_active)
        .bind(event.created_at)
        .bind(event.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        for participant in &event.participants {
            insert_participant(&mut tx, id, participant).await?;
        }

        tx.commit().await?;
        Ok(id)
    }

    /// Find event by ID
    async fn get_by_id(&self, id: EventId) -> Result<Option<Event>> {
        let sql = format!("SELECT {} FROM events WHERE id = $1", EVENT_COLUMNS);
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.assemble(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// List events matching a filter with pagination
    async fn find(&self, filter: &EventFilter, sort: EventSort, offset: u64, limit: u64) -> Result<(Vec<Event>, u64)> {
        let started = Instant::now();

        let mut page_query = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM events", EVENT_COLUMNS));
        push_filter(&mut page_query, filter);
        page_query
            .push(format!(" ORDER BY {} ASC, created_at DESC, id ASC", sort.order_expression()))
            .push(" LIMIT ")
            .push_bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .push(" OFFSET ")
            .push_bind(i64::try_from(offset).unwrap_or(i64::MAX));

        let page = async {
            page_query
                .build_query_as::<EventRow>()
                .fetch_all(&self.pool)
                .await
                .map_err(HelpingHandsError::from)
        };
        let (rows, total) = match futures::try_join!(page, self.count(filter)) {
            Ok(found) => found,
            Err(e) => {
                log_store_operation("find", "events", started.elapsed().as_millis() as u64, false);
                return Err(e);
            }
        };

        let events = self.assemble(rows).await?;
        log_store_operation("find", "events", started.elapsed().as_millis() as u64, true);
        Ok((events, total))
    }

    /// Update event
    async fn update(&self, id: EventId, changes: &EventChanges) -> Result<Option<Event>> {
        let sql = format!(
            r#"
            UPDATE events
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                thumbnail = COALESCE($5, thumbnail),
                location = COALESCE($6, location),
                event_date = COALESCE($7, event_date),
                capacity = COALESCE($8, capacity),
                updated_at = $9
            WHERE id = $1
            RETURNING {}
            "#,
            EVENT_COLUMNS
        );
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(id)
            .bind(changes.title.as_deref())
            .bind(changes.description.as_deref())
            .bind(changes.category)
            .bind(changes.thumbnail.as_deref())
            .bind(changes.location.as_deref())
            .bind(changes.event_date)
            .bind(changes.capacity.map(i64::from))
            .bind(current_timestamp())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.assemble(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Register participant for event.
    ///
    /// The event row stays locked (`FOR UPDATE`) from the capacity and
    /// duplicate checks until the insert commits, so concurrent joins on
    /// one event are serialized.
    async fn append_participant(&self, id: EventId, participant: &Participant) -> Result<AppendOutcome> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<(bool, i64)> = sqlx::query_as(
            "SELECT is_active, capacity FROM events WHERE id = $1 FOR UPDATE"
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((is_active, capacity)) = locked else {
            tx.rollback().await?;
            return Ok(AppendOutcome::NotFound);
        };
        if !is_active {
            tx.rollback().await?;
            return Ok(AppendOutcome::NotActive);
        }

        let (already_member,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM event_participants WHERE event_id = $1 AND user_id = $2)"
        )
        .bind(id)
        .bind(&participant.user_id)
        .fetch_one(&mut *tx)
        .await?;
        if already_member {
            tx.rollback().await?;
            return Ok(AppendOutcome::AlreadyMember);
        }

        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM event_participants WHERE event_id = $1"
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if capacity > 0 && count >= capacity {
            tx.rollback().await?;
            return Ok(AppendOutcome::Full {
                capacity: u32::try_from(capacity).unwrap_or(u32::MAX),
            });
        }

        if let Err(e) = insert_participant(&mut tx, id, participant).await {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    tx.rollback().await?;
                    return Ok(AppendOutcome::AlreadyMember);
                }
            }
            return Err(e.into());
        }

        sqlx::query("UPDATE events SET updated_at = $2 WHERE id = $1")
            .bind(id)
            .bind(current_timestamp())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(match self.get_by_id(id).await? {
            Some(event) => AppendOutcome::Appended(event),
            None => AppendOutcome::NotFound,
        })
    }

    /// Unregister participant from event
    async fn remove_participant(&self, id: EventId, user_id: &str) -> Result<RemoveOutcome> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM events WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            tx.rollback().await?;
            return Ok(RemoveOutcome::NotFound);
        }

        let removed = sqlx::query("DELETE FROM event_participants WHERE event_id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        if removed {
            sqlx::query("UPDATE events SET updated_at = $2 WHERE id = $1")
                .bind(id)
                .bind(current_timestamp())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(match self.get_by_id(id).await? {
            Some(event) if removed => RemoveOutcome::Removed(event),
            Some(event) => RemoveOutcome::NotMember(event),
            None => RemoveOutcome::NotFound,
        })
    }
}

async fn insert_participant(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    event_id: Uuid,
    participant: &Participant,
) -> sqlx::Result<()> {
    let sql = format!(
        "INSERT INTO event_participants ({}) VALUES ($1, $2, $3, $4, $5, $6)",
        PARTICIPANT_COLUMNS
    );
    sqlx::query(&sql)
        .bind(event_id)
        .bind(&participant.user_id)
        .bind(&participant.email)
        .bind(&participant.display_name)
        .bind(&participant.avatar_url)
        .bind(participant.joined_at)
        .execute(&mut **tx)
        .await?;

    Ok(())
}
