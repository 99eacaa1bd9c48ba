//! User email entity model.
//!
//! A user may register several addresses; at most one is primary, which the
//! schema enforces with a partial unique index on `(user_id)` where
//! `is_primary = 1`.

use chrono::{DateTime, Utc};
use directory_core::{EmailId, UserId};
use serde::{Deserialize, Serialize};
use sqlx::{Connection, FromRow, SqliteConnection, SqliteExecutor};

use crate::error::{conflict_on_constraint, require_non_empty, DbError};

/// An email address registered to a user.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserEmail {
    /// Unique identifier (opaque string).
    pub id: String,

    /// The owning user.
    pub user_id: String,

    /// The address, unique across the store.
    pub email: String,

    /// Whether this is the user's primary address.
    pub is_primary: bool,

    /// Whether ownership of the address was confirmed.
    pub is_verified: bool,

    /// When the address was verified, if ever.
    pub verified_at: Option<DateTime<Utc>>,

    /// When the address was registered.
    pub created_at: DateTime<Utc>,
}

/// Input for registering an email address.
#[derive(Debug, Clone)]
pub struct AddEmail {
    pub user_id: UserId,
    pub email: String,
    pub is_primary: bool,
    pub is_verified: bool,
}

impl UserEmail {
    /// Get the email ID as a typed `EmailId`.
    #[must_use]
    pub fn id(&self) -> EmailId {
        EmailId::from_stored(self.id.clone())
    }

    /// Get the user ID as a typed `UserId`.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        UserId::from_stored(self.user_id.clone())
    }

    /// Register an address for a user.
    ///
    /// When `is_primary` is set, the user's previous primary address (if
    /// any) is demoted in the same transaction, so there is never a moment
    /// with two primaries.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::ValidationFailed`] for an empty address and
    /// [`DbError::Conflict`] if the address is already registered or the
    /// user is unknown.
    pub async fn add(conn: &mut SqliteConnection, input: AddEmail) -> Result<Self, DbError> {
        let email = input.email.trim();
        require_non_empty("email", email)?;

        let id = EmailId::new();
        let now = Utc::now();

        let mut tx = conn.begin().await?;

        if input.is_primary {
            sqlx::query("UPDATE user_emails SET is_primary = 0 WHERE user_id = ?")
                .bind(input.user_id.as_str())
                .execute(&mut *tx)
                .await?;
        }

        let row: UserEmail = sqlx::query_as(
            r"
            INSERT INTO user_emails (id, user_id, email, is_primary, is_verified, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            ",
        )
        .bind(id.as_str())
        .bind(input.user_id.as_str())
        .bind(email)
        .bind(input.is_primary)
        .bind(input.is_verified)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            conflict_on_constraint(
                e,
                format!("email '{email}' is already registered or user is unknown"),
            )
        })?;

        tx.commit().await?;

        tracing::info!(email_id = %row.id, user_id = %row.user_id, "Email registered");
        Ok(row)
    }

    /// List a user's addresses, primary first.
    pub async fn list_for_user<'e, E>(executor: E, user_id: &UserId) -> Result<Vec<Self>, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let emails = sqlx::query_as(
            r"
            SELECT * FROM user_emails
            WHERE user_id = ?
            ORDER BY is_primary DESC, created_at
            ",
        )
        .bind(user_id.as_str())
        .fetch_all(executor)
        .await?;
        Ok(emails)
    }

    /// Look up an address anywhere in the store.
    pub async fn find_by_address<'e, E>(executor: E, email: &str) -> Result<Option<Self>, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let row = sqlx::query_as("SELECT * FROM user_emails WHERE email = ?")
            .bind(email)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    /// Fetch a user's primary address, if one is set.
    pub async fn primary_for_user<'e, E>(
        executor: E,
        user_id: &UserId,
    ) -> Result<Option<Self>, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let row = sqlx::query_as("SELECT * FROM user_emails WHERE user_id = ? AND is_primary = 1")
            .bind(user_id.as_str())
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    /// Make the given address the user's primary, demoting any previous one
    /// in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if the address does not exist or does
    /// not belong to the user.
    pub async fn set_primary(
        conn: &mut SqliteConnection,
        user_id: &UserId,
        email_id: &EmailId,
    ) -> Result<Self, DbError> {
        let mut tx = conn.begin().await?;

        sqlx::query("UPDATE user_emails SET is_primary = 0 WHERE user_id = ?")
            .bind(user_id.as_str())
            .execute(&mut *tx)
            .await?;

        let row: Option<UserEmail> = sqlx::query_as(
            r"
            UPDATE user_emails SET is_primary = 1
            WHERE id = ? AND user_id = ?
            RETURNING *
            ",
        )
        .bind(email_id.as_str())
        .bind(user_id.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Err(DbError::NotFound {
                resource: "email",
                id: email_id.to_string(),
            });
        };

        tx.commit().await?;
        Ok(row)
    }

    /// Mark an address as verified, recording the verification time.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if the address does not exist.
    pub async fn mark_verified<'e, E>(executor: E, email_id: &EmailId) -> Result<Self, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let row: Option<UserEmail> = sqlx::query_as(
            r"
            UPDATE user_emails SET is_verified = 1, verified_at = ?
            WHERE id = ?
            RETURNING *
            ",
        )
        .bind(Utc::now())
        .bind(email_id.as_str())
        .fetch_optional(executor)
        .await?;

        row.ok_or_else(|| DbError::NotFound {
            resource: "email",
            id: email_id.to_string(),
        })
    }

    /// Remove an address.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if the address does not exist.
    pub async fn remove<'e, E>(executor: E, email_id: &EmailId) -> Result<(), DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM user_emails WHERE id = ?")
            .bind(email_id.as_str())
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound {
                resource: "email",
                id: email_id.to_string(),
            });
        }
        Ok(())
    }
}
