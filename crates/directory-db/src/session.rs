//! Request-scoped database session.
//!
//! A [`Session`] pins one pooled connection for the duration of a request so
//! that every repository call made while handling it runs on the same
//! connection. Dropping the session returns the connection to the pool on
//! all exit paths, including error returns and panics.

use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqliteConnection};

use crate::error::DbError;
use crate::pool::DbPool;

/// One pooled connection, held for the lifetime of a request.
///
/// Sessions are never shared between concurrent requests; each handler
/// opens its own.
///
/// # Example
///
/// ```rust,ignore
/// let mut session = Session::open(&pool).await?;
/// let domain = Domain::get_by_name(session.conn(), "localhost").await?;
/// // connection is released when `session` goes out of scope
/// ```
#[derive(Debug)]
pub struct Session {
    conn: PoolConnection<Sqlite>,
}

impl Session {
    /// Acquire a connection from the pool.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::ConnectionFailed`] if the pool is closed or
    /// exhausted.
    pub async fn open(pool: &DbPool) -> Result<Self, DbError> {
        let conn = pool
            .inner()
            .acquire()
            .await
            .map_err(DbError::ConnectionFailed)?;
        Ok(Self { conn })
    }

    /// The connection backing this session.
    ///
    /// Hand the result to repository calls; reborrow (`&mut *`) for
    /// multiple sequential calls.
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.conn
    }
}
