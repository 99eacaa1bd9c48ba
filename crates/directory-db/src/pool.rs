//! Database connection pool management.
//!
//! The pool is constructed once at process start and handed to every
//! component that needs storage access. Foreign-key enforcement is switched
//! on for every connection so that the cascade/restrict rules declared in
//! the schema actually apply.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::SqlitePool;

use crate::error::DbError;

/// Shared connection pool for the directory store.
#[derive(Debug, Clone)]
pub struct DbPool {
    pool: SqlitePool,
}

impl DbPool {
    /// Open (creating if necessary) a file-backed store at `path`.
    ///
    /// The parent directory is created if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::ConnectionFailed`] if the file or its directory
    /// cannot be created or the pool cannot be established.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DbError::ConnectionFailed(sqlx::Error::Io(e)))?;
            }
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))
            .map_err(DbError::ConnectionFailed)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            // Avoids transient "database is locked" errors under concurrency.
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .map_err(DbError::ConnectionFailed)?;

        tracing::info!(path = %path.display(), "Connected to directory store");

        Ok(Self { pool })
    }

    /// Open an in-memory store for tests.
    ///
    /// The pool is capped at a single connection: each SQLite in-memory
    /// connection gets its own private database, so a larger pool would
    /// scatter tables across connections.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::ConnectionFailed`] if the pool cannot be
    /// established.
    pub async fn connect_in_memory() -> Result<Self, DbError> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(DbError::ConnectionFailed)?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await
            .map_err(DbError::ConnectionFailed)?;

        Ok(Self { pool })
    }

    /// Access the underlying `SQLx` pool.
    #[must_use]
    pub fn inner(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close all connections in the pool.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Directory store pool closed");
    }
}
