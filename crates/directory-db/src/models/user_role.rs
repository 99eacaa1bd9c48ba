//! User-role assignment model.
//!
//! Many-to-many join between users and roles.

use chrono::{DateTime, Utc};
use directory_core::{RoleId, UserId};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteExecutor};

use crate::error::{conflict_on_constraint, DbError};
use crate::models::{Role, User};

/// A role assignment linking a user to a role.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserRole {
    /// Unique identifier (opaque string).
    pub id: String,

    /// The user this role is assigned to.
    pub user_id: String,

    /// The assigned role.
    pub role_id: String,

    /// When the role was assigned.
    pub assigned_at: DateTime<Utc>,
}

impl UserRole {
    /// Get the user ID as a typed `UserId`.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        UserId::from_stored(self.user_id.clone())
    }

    /// Get the role ID as a typed `RoleId`.
    #[must_use]
    pub fn role_id(&self) -> RoleId {
        RoleId::from_stored(self.role_id.clone())
    }

    /// Assign a role to a user.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Conflict`] if the assignment already exists or
    /// either side is unknown.
    pub async fn assign<'e, E>(
        executor: E,
        user_id: &UserId,
        role_id: &RoleId,
    ) -> Result<Self, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let row: UserRole = sqlx::query_as(
            r"
            INSERT INTO user_roles (id, user_id, role_id, assigned_at)
            VALUES (?, ?, ?, ?)
            RETURNING *
            ",
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(user_id.as_str())
        .bind(role_id.as_str())
        .bind(Utc::now())
        .fetch_one(executor)
        .await
        .map_err(|e| {
            conflict_on_constraint(
                e,
                format!("user {user_id} already has role {role_id}, or user/role is unknown"),
            )
        })?;

        tracing::info!(user_id = %user_id, role_id = %role_id, "Role assigned");
        Ok(row)
    }

    /// Remove a role from a user. Returns whether an assignment existed.
    pub async fn remove<'e, E>(
        executor: E,
        user_id: &UserId,
        role_id: &RoleId,
    ) -> Result<bool, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM user_roles WHERE user_id = ? AND role_id = ?")
            .bind(user_id.as_str())
            .bind(role_id.as_str())
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Check whether a user holds a role.
    pub async fn has_role<'e, E>(
        executor: E,
        user_id: &UserId,
        role_id: &RoleId,
    ) -> Result<bool, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM user_roles WHERE user_id = ? AND role_id = ?")
                .bind(user_id.as_str())
                .bind(role_id.as_str())
                .fetch_optional(executor)
                .await?;

        Ok(row.is_some())
    }

    /// All roles held by a user, ordered by role name.
    pub async fn roles_for_user<'e, E>(executor: E, user_id: &UserId) -> Result<Vec<Role>, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let roles = sqlx::query_as(
            r"
            SELECT r.* FROM user_roles ur
            JOIN roles r ON ur.role_id = r.id
            WHERE ur.user_id = ?
            ORDER BY r.name
            ",
        )
        .bind(user_id.as_str())
        .fetch_all(executor)
        .await?;
        Ok(roles)
    }

    /// All users holding a role, ordered by username.
    pub async fn users_for_role<'e, E>(executor: E, role_id: &RoleId) -> Result<Vec<User>, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let users = sqlx::query_as(
            r"
            SELECT u.* FROM user_roles ur
            JOIN users u ON ur.user_id = u.id
            WHERE ur.role_id = ?
            ORDER BY u.username
            ",
        )
        .bind(role_id.as_str())
        .fetch_all(executor)
        .await?;
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_id_accessors() {
        let row = UserRole {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: uuid::Uuid::new_v4().to_string(),
            role_id: uuid::Uuid::new_v4().to_string(),
            assigned_at: Utc::now(),
        };
        assert_eq!(row.user_id().as_str(), row.user_id);
        assert_eq!(row.role_id().as_str(), row.role_id);
    }
}
