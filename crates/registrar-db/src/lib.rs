//! # Registrar DB
//!
//! PostgreSQL connection pool and schema migrations for the Registrar API.
//!
//! Only used when the postgres storage backend is selected; the in-memory
//! backend never opens a connection.
//!
//! # Example
//!
//! ```ignore
//! use registrar_config::StorageConfig;
//! use registrar_db::{init_db_pool, run_migrations};
//!
//! let config = StorageConfig::from_env()?;
//! let pool = init_db_pool(&config).await?;
//! run_migrations(&pool).await?;
//! ```

use std::time::Duration;

use anyhow::Context;
use registrar_config::StorageConfig;
use sqlx::postgres::PgPoolOptions;

/// Opens a PostgreSQL pool sized from `DATABASE_MAX_CONNECTIONS`.
///
/// Fails when `DATABASE_URL` is missing or the database cannot be reached.
pub async fn init_db_pool(config: &StorageConfig) -> anyhow::Result<PgPool> {
    let database_url = config.require_database_url()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!(
        max_connections = config.max_connections,
        "Database pool initialized"
    );

    Ok(pool)
}

/// Applies the SQL migrations under `migrations/`.
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Database migrations applied");
    Ok(())
}

// Re-export PgPool for convenience
pub use sqlx::PgPool;
