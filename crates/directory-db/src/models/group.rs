//! Group entity model.
//!
//! Groups belong to a domain; their names are unique within that domain
//! only, so two domains may each have an "engineering" group.

use chrono::{DateTime, Utc};
use directory_core::{DomainId, GroupId};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteExecutor};

use crate::error::{conflict_on_constraint, require_non_empty, DbError};

/// A directory group.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Group {
    /// Unique identifier (opaque string).
    pub id: String,

    /// Group name, unique within the owning domain.
    pub name: String,

    /// Optional free-form description.
    pub description: Option<String>,

    /// The domain this group belongs to.
    pub domain_id: String,

    /// When the group was created.
    pub created_at: DateTime<Utc>,

    /// When the group was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a group.
#[derive(Debug, Clone)]
pub struct CreateGroup {
    pub name: String,
    pub description: Option<String>,
    pub domain_id: DomainId,
}

/// Partial update for a group. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateGroup {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl Group {
    /// Get the group ID as a typed `GroupId`.
    #[must_use]
    pub fn id(&self) -> GroupId {
        GroupId::from_stored(self.id.clone())
    }

    /// Get the domain ID as a typed `DomainId`.
    #[must_use]
    pub fn domain_id(&self) -> DomainId {
        DomainId::from_stored(self.domain_id.clone())
    }

    /// Create a new group.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::ValidationFailed`] for an empty name and
    /// [`DbError::Conflict`] if the name is taken within the domain or the
    /// domain is unknown.
    pub async fn create<'e, E>(executor: E, input: CreateGroup) -> Result<Self, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let name = input.name.trim();
        require_non_empty("name", name)?;

        let id = GroupId::new();
        let now = Utc::now();

        let group: Group = sqlx::query_as(
            r"
            INSERT INTO groups (id, name, description, domain_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            ",
        )
        .bind(id.as_str())
        .bind(name)
        .bind(&input.description)
        .bind(input.domain_id.as_str())
        .bind(now)
        .bind(now)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            conflict_on_constraint(
                e,
                format!("group '{name}' already exists in this domain, or domain is unknown"),
            )
        })?;

        tracing::info!(group_id = %group.id, name = %group.name, domain_id = %group.domain_id, "Group created");
        Ok(group)
    }

    /// Fetch a group by ID.
    pub async fn get<'e, E>(executor: E, id: &GroupId) -> Result<Option<Self>, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let group = sqlx::query_as("SELECT * FROM groups WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(executor)
            .await?;
        Ok(group)
    }

    /// Fetch a group by name within one domain.
    pub async fn get_by_name<'e, E>(
        executor: E,
        domain_id: &DomainId,
        name: &str,
    ) -> Result<Option<Self>, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let group = sqlx::query_as("SELECT * FROM groups WHERE domain_id = ? AND name = ?")
            .bind(domain_id.as_str())
            .bind(name)
            .fetch_optional(executor)
            .await?;
        Ok(group)
    }

    /// List all groups ordered by name.
    pub async fn list_all<'e, E>(executor: E) -> Result<Vec<Self>, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let groups = sqlx::query_as("SELECT * FROM groups ORDER BY name")
            .fetch_all(executor)
            .await?;
        Ok(groups)
    }

    /// List groups in one domain ordered by name.
    pub async fn list_by_domain<'e, E>(
        executor: E,
        domain_id: &DomainId,
    ) -> Result<Vec<Self>, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let groups = sqlx::query_as("SELECT * FROM groups WHERE domain_id = ? ORDER BY name")
            .bind(domain_id.as_str())
            .fetch_all(executor)
            .await?;
        Ok(groups)
    }

    /// Apply a partial update, bumping `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if the group does not exist,
    /// [`DbError::ValidationFailed`] for an empty replacement name, and
    /// [`DbError::Conflict`] if a replacement name collides within the
    /// domain.
    pub async fn update<'e, E>(
        executor: E,
        id: &GroupId,
        changes: UpdateGroup,
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
        sets.push("updated_at = ?");

        let sql = format!(
            "UPDATE groups SET {} WHERE id = ? RETURNING *",
            sets.join(", ")
        );

        let mut query = sqlx::query_as::<_, Group>(&sql);
        if let Some(name) = name {
            query = query.bind(name.to_string());
        }
        if let Some(description) = &changes.description {
            query = query.bind(description);
        }

        let group = query
            .bind(Utc::now())
            .bind(id.as_str())
            .fetch_optional(executor)
            .await
            .map_err(|e| conflict_on_constraint(e, "group name already exists in this domain"))?;

        group.ok_or_else(|| DbError::NotFound {
            resource: "group",
            id: id.to_string(),
        })
    }

    /// Delete a group. Memberships are removed by cascade.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if the group does not exist.
    pub async fn delete<'e, E>(executor: E, id: &GroupId) -> Result<(), DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM groups WHERE id = ?")
            .bind(id.as_str())
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound {
                resource: "group",
                id: id.to_string(),
            });
        }

        tracing::info!(group_id = %id, "Group deleted");
        Ok(())
    }
}
