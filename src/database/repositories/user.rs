//! User repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::database::store::UserStore;
use crate::models::event::EventId;
use crate::models::user::{Identity, UserProfile};
use crate::utils::errors::Result;

#[derive(Debug, FromRow)]
struct ProfileRow {
    uid: String,
    email: String,
    display_name: String,
    avatar_url: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProfileRow {
    fn into_profile(self, joined_event_ids: Vec<EventId>) -> UserProfile {
        UserProfile {
            uid: self.uid,
            email: self.email,
            display_name: self.display_name,
            avatar_url: self.avatar_url,
            joined_event_ids,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Clone)]
#[derive(Debug)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    /// Create or refresh a profile from identity data; an empty avatar keeps the stored one
    async fn upsert_profile(&self, identity: &Identity) -> Result<UserProfile> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            INSERT INTO user_profiles (uid, email, display_name, avatar_url, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            ON CONFLICT (uid) DO UPDATE
            SET email = EXCLUDED.email,
                display_name = EXCLUDED.display_name,
                avatar_url = CASE WHEN EXCLUDED.avatar_url = '' THEN user_profiles.avatar_url
                                  ELSE EXCLUDED.avatar_url END,
                updated_at = EXCLUDED.updated_at
            RETURNING uid, email, display_name, avatar_url, created_at, updated_at
            "#
        )
        .bind(&identity.uid)
        .bind(&identity.email)
        .bind(&identity.display_name)
        .bind(&identity.photo_url)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        let joined = self.get_joined_event_ids(&row.uid).await?;
        Ok(row.into_profile(joined))
    }

    /// Find profile by user ID
    async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT uid, email, display_name, avatar_url, created_at, updated_at FROM user_profiles WHERE uid = $1"
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let joined = self.get_joined_event_ids(uid).await?;
                Ok(Some(row.into_profile(joined)))
            }
            None => Ok(None),
        }
    }

    async fn add_joined_event(&self, uid: &str, event_id: EventId) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_joined_events (user_id, event_id, added_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, event_id) DO NOTHING
            "#
        )
        .bind(uid)
        .bind(event_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove_joined_event(&self, uid: &str, event_id: EventId) -> Result<()> {
        sqlx::query("DELETE FROM user_joined_events WHERE user_id = $1 AND event_id = $2")
            .bind(uid)
            .bind(event_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn get_joined_event_ids(&self, uid: &str) -> Result<Vec<EventId>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT event_id FROM user_joined_events WHERE user_id = $1 ORDER BY added_at ASC, event_id ASC"
        )
        .bind(uid)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }
}
