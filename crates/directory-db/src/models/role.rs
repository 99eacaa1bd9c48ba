//! Role entity model.
//!
//! Roles are global (not domain-scoped) and assigned to users through the
//! `user_roles` join table.

use chrono::{DateTime, Utc};
use directory_core::RoleId;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteExecutor};

use crate::error::{conflict_on_constraint, require_non_empty, DbError};

/// A directory role.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Role {
    /// Unique identifier (opaque string).
    pub id: String,

    /// Role name, unique across the store.
    pub name: String,

    /// Optional free-form description.
    pub description: Option<String>,

    /// When the role was created.
    pub created_at: DateTime<Utc>,
}

/// Partial update for a role. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateRole {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl Role {
    /// Get the role ID as a typed `RoleId`.
    #[must_use]
    pub fn id(&self) -> RoleId {
        RoleId::from_stored(self.id.clone())
    }

    /// Create a new role.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::ValidationFailed`] for an empty name and
    /// [`DbError::Conflict`] if the name is already taken.
    pub async fn create<'e, E>(
        executor: E,
        name: &str,
        description: Option<&str>,
    ) -> Result<Self, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let name = name.trim();
        require_non_empty("name", name)?;

        let id = RoleId::new();

        let role: Role = sqlx::query_as(
            r"
            INSERT INTO roles (id, name, description, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING *
            ",
        )
        .bind(id.as_str())
        .bind(name)
        .bind(description)
        .bind(Utc::now())
        .fetch_one(executor)
        .await
        .map_err(|e| conflict_on_constraint(e, format!("role '{name}' already exists")))?;

        tracing::info!(role_id = %role.id, name = %role.name, "Role created");
        Ok(role)
    }

    /// Fetch a role by ID.
    pub async fn get<'e, E>(executor: E, id: &RoleId) -> Result<Option<Self>, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let role = sqlx::query_as("SELECT * FROM roles WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(executor)
            .await?;
        Ok(role)
    }

    /// Fetch a role by its unique name.
    pub async fn get_by_name<'e, E>(executor: E, name: &str) -> Result<Option<Self>, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let role = sqlx::query_as("SELECT * FROM roles WHERE name = ?")
            .bind(name)
            .fetch_optional(executor)
            .await?;
        Ok(role)
    }

    /// List all roles ordered by name.
    pub async fn list_all<'e, E>(executor: E) -> Result<Vec<Self>, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let roles = sqlx::query_as("SELECT * FROM roles ORDER BY name")
            .fetch_all(executor)
            .await?;
        Ok(roles)
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if the role does not exist,
    /// [`DbError::ValidationFailed`] for an empty replacement name, and
    /// [`DbError::Conflict`] if a replacement name is already taken.
    pub async fn update<'e, E>(
        executor: E,
        id: &RoleId,
        changes: UpdateRole,
    ) -> Result<Self, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let name = changes.name.as_deref().map(str::trim);
        if let Some(name) = name {
            require_non_empty("name", name)?;
        }

        let mut sets = Vec::new();
        if name.is_some() {
            sets.push("name = ?");
        }
        if changes.description.is_some() {
            sets.push("description = ?");
        }

        if sets.is_empty() {
            return Self::get(executor, id).await?.ok_or_else(|| DbError::NotFound {
                resource: "role",
                id: id.to_string(),
            });
        }

        let sql = format!("UPDATE roles SET {} WHERE id = ? RETURNING *", sets.join(", "));

        let mut query = sqlx::query_as::<_, Role>(&sql);
        if let Some(name) = name {
            query = query.bind(name.to_string());
        }
        if let Some(description) = &changes.description {
            query = query.bind(description);
        }

        let role = query
            .bind(id.as_str())
            .fetch_optional(executor)
            .await
            .map_err(|e| conflict_on_constraint(e, "role name already exists"))?;

        role.ok_or_else(|| DbError::NotFound {
            resource: "role",
            id: id.to_string(),
        })
    }

    /// Delete a role. Assignments referencing it are removed by cascade.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if the role does not exist.
    pub async fn delete<'e, E>(executor: E, id: &RoleId) -> Result<(), DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM roles WHERE id = ?")
            .bind(id.as_str())
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound {
                resource: "role",
                id: id.to_string(),
            });
        }

        tracing::info!(role_id = %id, "Role deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_id_accessor() {
        let raw = uuid::Uuid::new_v4().to_string();
        let role = Role {
            id: raw.clone(),
            name: "admin".to_string(),
            description: Some("Administrator with full access".to_string()),
            created_at: Utc::now(),
        };
        assert_eq!(role.id().as_str(), raw);
    }
}
