//! HelpingHands backend
//!
//! Main application entry point. Boots configuration, logging and the
//! PostgreSQL stores, then either repairs the joined-event index for the
//! users given with `--reconcile` or stays up until interrupted.

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};

use HelpingHands::{
    config::Settings,
    database::{create_pool, run_migrations, DatabaseService},
    services::ServiceFactory,
    utils::logging,
};

#[derive(Parser, Debug)]
#[command(name = "helpinghands", about = "HelpingHands event registration backend", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<String>,

    /// Rebuild the joined-event index for these users, then exit
    #[arg(long, value_name = "USER_ID", num_args = 1..)]
    reconcile: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::from_file(path),
        None => Settings::new(),
    }
    .context("failed to load configuration")?;
    settings.validate()?;

    // Initialize logging; the guard flushes the file writer on drop
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", HelpingHands::info());

    // Initialize database connection
    info!("Connecting to database...");
    let pool = create_pool(&settings.database)?;

    // Run database migrations
    info!("Running database migrations...");
    run_migrations(&pool).await?;

    let database_service = DatabaseService::new(pool);

    // Initialize services
    info!("Initializing services...");
    let services = ServiceFactory::from_database(&database_service, &settings);

    let health = services.health_check().await;
    if !health.is_healthy() {
        for issue in health.get_issues() {
            warn!(issue = %issue, "Service health check failed");
        }
    }

    let failed = if cli.reconcile.is_empty() {
        info!("HelpingHands backend is ready");
        tokio::signal::ctrl_c().await?;
        info!("Shutdown signal received");
        Vec::new()
    } else {
        reconcile_all(&services, &cli.reconcile).await
    };

    database_service.close().await;
    info!("HelpingHands backend has been shut down.");

    if !failed.is_empty() {
        anyhow::bail!("failed to reconcile user index for {}", failed.join(", "));
    }
    Ok(())
}

/// Reconcile each user in turn; returns the ids that could not be repaired
async fn reconcile_all(services: &ServiceFactory, user_ids: &[String]) -> Vec<String> {
    let mut failed = Vec::new();
    for user_id in user_ids {
        match services.participation.reconcile_user_index(user_id).await {
            Ok(report) => info!(
                user_id = %user_id,
                added = report.added.len(),
                removed = report.removed.len(),
                "Reconciled user index"
            ),
            Err(e) => {
                error!(user_id = %user_id, error = %e, "Failed to reconcile user index");
                failed.push(user_id.clone());
            }
        }
    }
    failed
}
