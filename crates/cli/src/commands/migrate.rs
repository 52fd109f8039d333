//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! reviews-cli migrate
//! ```
//!
//! Applies `crates/api/migrations/` (the `reviews` schema), then creates the
//! `tower_sessions` schema used by the session layer. Both steps are
//! idempotent.
//!
//! # Environment Variables
//!
//! - `REVIEWS_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

use thiserror::Error;
use tower_sessions_sqlx_store::PostgresStore;

use reviews_api::config::{ApiConfig, ConfigError};
use reviews_api::db;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run all migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the configuration is incomplete, the database
/// is unreachable or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let config = ApiConfig::from_env()?;

    tracing::info!("Connecting to reviews database...");
    let pool = db::create_pool(&config.database_url, 1).await?;

    tracing::info!("Running reviews migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    tracing::info!("Creating session store table...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
