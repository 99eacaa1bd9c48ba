//! Database migration management.
//!
//! Provides functions to run and manage versioned SQL migrations.

use crate::error::DbError;
use crate::pool::DbPool;

/// Run all pending database migrations.
///
/// Migrations are embedded at compile time from the `migrations/` directory.
/// Each migration is run in order based on its filename prefix (001_, 002_,
/// etc.) and is a no-op once applied, so calling this on every start is safe.
///
/// # Example
///
/// ```rust,ignore
/// use directory_db::{run_migrations, DbPool};
///
/// let pool = DbPool::connect("/var/lib/directory/users.db").await?;
/// run_migrations(&pool).await?;
/// ```
///
/// # Errors
///
/// Returns `DbError::MigrationFailed` if any migration fails to apply.
pub async fn run_migrations(pool: &DbPool) -> Result<(), DbError> {
    tracing::info!("Running database migrations...");

    sqlx::migrate!("./migrations")
        .run(pool.inner())
        .await
        .map_err(DbError::MigrationFailed)?;

    tracing::info!("Migrations completed successfully");
    Ok(())
}
