//! Database connection management

use sqlx::{Pool, Postgres};
use crate::config::DatabaseConfig;
use crate::utils::errors::HelpingHandsError;

pub type DatabasePool = Pool<Postgres>;

/// Create the process-wide connection pool.
///
/// Connections are opened lazily on first use; call [`health_check`] to
/// verify connectivity up front.
pub fn create_pool(config: &DatabaseConfig) -> Result<DatabasePool, HelpingHandsError> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout())
        .connect_lazy(&config.url)?;

    tracing::info!(max_connections = config.max_connections, "Database connection pool created");
    Ok(pool)
}

/// Run database migrations
pub async fn run_migrations(pool: &DatabasePool) -> Result<(), HelpingHandsError> {
    tracing::info!("Running database migrations...");

    sqlx::migrate!("./migrations")
        .run(pool)
        .await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}

/// Check database health
pub async fn health_check(pool: &DatabasePool) -> Result<(), HelpingHandsError> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await?;

    Ok(())
}
