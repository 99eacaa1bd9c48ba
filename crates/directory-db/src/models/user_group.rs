//! User-group membership model.
//!
//! Many-to-many join between users and groups.

use chrono::{DateTime, Utc};
use directory_core::{GroupId, UserId};
use serde::{Deserialize, Serialize};
use sqlx::{Connection, FromRow, SqliteConnection, SqliteExecutor};

use crate::error::{conflict_on_constraint, DbError};
use crate::models::{Group, User};

/// A group membership linking a user to a group.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserGroup {
    /// Unique identifier (opaque string).
    pub id: String,

    /// The member user.
    pub user_id: String,

    /// The group.
    pub group_id: String,

    /// When the user was added.
    pub added_at: DateTime<Utc>,
}

impl UserGroup {
    /// Get the user ID as a typed `UserId`.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        UserId::from_stored(self.user_id.clone())
    }

    /// Get the group ID as a typed `GroupId`.
    #[must_use]
    pub fn group_id(&self) -> GroupId {
        GroupId::from_stored(self.group_id.clone())
    }

    /// Add a user to a group.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Conflict`] if the user is already a member or
    /// either side is unknown.
    pub async fn add_member<'e, E>(
        executor: E,
        user_id: &UserId,
        group_id: &GroupId,
    ) -> Result<Self, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let row: UserGroup = sqlx::query_as(
            r"
            INSERT INTO user_groups (id, user_id, group_id, added_at)
            VALUES (?, ?, ?, ?)
            RETURNING *
            ",
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(user_id.as_str())
        .bind(group_id.as_str())
        .bind(Utc::now())
        .fetch_one(executor)
        .await
        .map_err(|e| {
            conflict_on_constraint(
                e,
                format!("user {user_id} is already in group {group_id}, or user/group is unknown"),
            )
        })?;

        tracing::info!(user_id = %user_id, group_id = %group_id, "Group member added");
        Ok(row)
    }

    /// Remove a user from a group. Returns whether a membership existed.
    pub async fn remove_member<'e, E>(
        executor: E,
        user_id: &UserId,
        group_id: &GroupId,
    ) -> Result<bool, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM user_groups WHERE user_id = ? AND group_id = ?")
            .bind(user_id.as_str())
            .bind(group_id.as_str())
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Check if a user is a member of a group.
    pub async fn is_member<'e, E>(
        executor: E,
        user_id: &UserId,
        group_id: &GroupId,
    ) -> Result<bool, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM user_groups WHERE user_id = ? AND group_id = ?")
                .bind(user_id.as_str())
                .bind(group_id.as_str())
                .fetch_optional(executor)
                .await?;

        Ok(row.is_some())
    }

    /// All members of a group, ordered by username.
    pub async fn members_of<'e, E>(executor: E, group_id: &GroupId) -> Result<Vec<User>, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let users = sqlx::query_as(
            r"
            SELECT u.* FROM user_groups ug
            JOIN users u ON ug.user_id = u.id
            WHERE ug.group_id = ?
            ORDER BY u.username
            ",
        )
        .bind(group_id.as_str())
        .fetch_all(executor)
        .await?;
        Ok(users)
    }

    /// All groups a user belongs to, ordered by group name.
    pub async fn groups_for_user<'e, E>(
        executor: E,
        user_id: &UserId,
    ) -> Result<Vec<Group>, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let groups = sqlx::query_as(
            r"
            SELECT g.* FROM user_groups ug
            JOIN groups g ON ug.group_id = g.id
            WHERE ug.user_id = ?
            ORDER BY g.name
            ",
        )
        .bind(user_id.as_str())
        .fetch_all(executor)
        .await?;
        Ok(groups)
    }

    /// Replace the full member list of a group in a single transaction.
    ///
    /// Either every removal and addition takes effect, or none do.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Conflict`] if any listed user is unknown; the
    /// previous membership is left untouched in that case.
    pub async fn replace_members(
        conn: &mut SqliteConnection,
        group_id: &GroupId,
        user_ids: &[UserId],
    ) -> Result<(), DbError> {
        let mut tx = conn.begin().await?;

        sqlx::query("DELETE FROM user_groups WHERE group_id = ?")
            .bind(group_id.as_str())
            .execute(&mut *tx)
            .await?;

        let now = Utc::now();
        for user_id in user_ids {
            sqlx::query(
                r"
                INSERT INTO user_groups (id, user_id, group_id, added_at)
                VALUES (?, ?, ?, ?)
                ",
            )
            .bind(uuid::Uuid::new_v4().to_string())
            .bind(user_id.as_str())
            .bind(group_id.as_str())
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| conflict_on_constraint(e, format!("user {user_id} is unknown")))?;
        }

        tx.commit().await?;

        tracing::info!(group_id = %group_id, members = user_ids.len(), "Group members replaced");
        Ok(())
    }

    /// Count members in a group.
    pub async fn count_members<'e, E>(executor: E, group_id: &GroupId) -> Result<i64, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM user_groups WHERE group_id = ?")
            .bind(group_id.as_str())
            .fetch_one(executor)
            .await?;
        Ok(count)
    }
}
