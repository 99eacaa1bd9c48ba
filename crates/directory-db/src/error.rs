//! Error types for the directory-db crate.
//!
//! Provides a unified error type that wraps `SQLx` errors with additional
//! context, plus the validation/conflict/not-found variants that repository
//! operations report to callers.

use thiserror::Error;

/// Database operation errors.
///
/// # Example
///
/// ```rust
/// use directory_db::DbError;
///
/// fn handle_error(err: DbError) {
///     match err {
///         DbError::ConnectionFailed(e) => eprintln!("Cannot connect: {e}"),
///         DbError::MigrationFailed(e) => eprintln!("Migration error: {e}"),
///         DbError::QueryFailed(e) => eprintln!("Query error: {e}"),
///         DbError::ValidationFailed { field, message } => {
///             eprintln!("Invalid {field}: {message}");
///         }
///         DbError::Conflict(msg) => eprintln!("Conflict: {msg}"),
///         DbError::NotFound { resource, id } => eprintln!("No {resource} {id}"),
///     }
/// }
/// ```
#[derive(Debug, Error)]
pub enum DbError {
    /// Failed to establish or acquire a database connection.
    #[error("Database connection failed: {0}")]
    ConnectionFailed(#[source] sqlx::Error),

    /// A database migration failed to apply.
    ///
    /// Migration failure is fatal: the schema may be in an unknown state.
    #[error("Migration failed: {0}")]
    MigrationFailed(#[source] sqlx::migrate::MigrateError),

    /// A database query failed to execute.
    #[error("Query failed: {0}")]
    QueryFailed(#[source] sqlx::Error),

    /// Caller-supplied input was rejected before touching storage.
    #[error("Validation failed for {field}: {message}")]
    ValidationFailed {
        /// The input field that failed validation.
        field: &'static str,
        /// Human-readable description of the problem.
        message: String,
    },

    /// A uniqueness or referential-integrity constraint was violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Resource not found.
    #[error("{resource} not found: {id}")]
    NotFound {
        /// The kind of resource looked up (e.g. "user", "domain").
        resource: &'static str,
        /// The identifier or natural key that was looked up.
        id: String,
    },
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        DbError::QueryFailed(err)
    }
}

impl DbError {
    /// Check if this error indicates a connection problem.
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(self, DbError::ConnectionFailed(_))
    }

    /// Check if this error indicates a validation error.
    #[must_use]
    pub fn is_validation_failed(&self) -> bool {
        matches!(self, DbError::ValidationFailed { .. })
    }

    /// Check if this error indicates a conflict.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, DbError::Conflict(_))
    }

    /// Check if this error indicates a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound { .. })
    }
}

/// Reject empty or whitespace-only values for required name-like fields.
pub(crate) fn require_non_empty(field: &'static str, value: &str) -> Result<(), DbError> {
    if value.trim().is_empty() {
        return Err(DbError::ValidationFailed {
            field,
            message: "must not be empty".to_string(),
        });
    }
    Ok(())
}

/// Map constraint violations to [`DbError::Conflict`] with a caller-supplied
/// message; every other failure stays a [`DbError::QueryFailed`].
pub(crate) fn conflict_on_constraint(err: sqlx::Error, message: impl Into<String>) -> DbError {
    match &err {
        sqlx::Error::Database(db)
            if db.is_unique_violation() || db.is_foreign_key_violation() =>
        {
            DbError::Conflict(message.into())
        }
        _ => DbError::QueryFailed(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_failed_display() {
        let err = DbError::ValidationFailed {
            field: "name",
            message: "must not be empty".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Validation failed for name: must not be empty"
        );
        assert!(err.is_validation_failed());
        assert!(!err.is_conflict());
    }

    #[test]
    fn test_not_found_display() {
        let err = DbError::NotFound {
            resource: "user",
            id: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "user not found: abc");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_require_non_empty() {
        assert!(require_non_empty("name", "acme").is_ok());
        assert!(require_non_empty("name", "").is_err());
        assert!(require_non_empty("name", "   ").is_err());
    }

    #[test]
    fn test_row_not_found_maps_to_query_failed() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::QueryFailed(_)));
    }
}
