//! Domain entity model.
//!
//! A domain is the partition owning users and groups. Exactly one domain
//! carries the `is_default` flag in a freshly bootstrapped store.

use chrono::{DateTime, Utc};
use directory_core::DomainId;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection, SqliteExecutor};

use crate::error::{conflict_on_constraint, require_non_empty, DbError};

/// A directory domain.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Domain {
    /// Unique identifier (opaque string).
    pub id: String,

    /// Domain name, unique across the store.
    pub name: String,

    /// Optional free-form description.
    pub description: Option<String>,

    /// Whether this is the default domain.
    pub is_default: bool,

    /// When the domain was created.
    pub created_at: DateTime<Utc>,

    /// When the domain was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a domain.
#[derive(Debug, Clone, Default)]
pub struct CreateDomain {
    pub name: String,
    pub description: Option<String>,
    pub is_default: bool,
}

/// Partial update for a domain. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateDomain {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_default: Option<bool>,
}

impl Domain {
    /// Get the domain ID as a typed `DomainId`.
    #[must_use]
    pub fn id(&self) -> DomainId {
        DomainId::from_stored(self.id.clone())
    }

    /// Create a new domain.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::ValidationFailed`] for an empty name and
    /// [`DbError::Conflict`] if the name is already taken.
    pub async fn create<'e, E>(executor: E, input: CreateDomain) -> Result<Self, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let name = input.name.trim();
        require_non_empty("name", name)?;

        let id = DomainId::new();
        let now = Utc::now();

        let domain: Domain = sqlx::query_as(
            r"
            INSERT INTO domains (id, name, description, is_default, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            ",
        )
        .bind(id.as_str())
        .bind(name)
        .bind(&input.description)
        .bind(input.is_default)
        .bind(now)
        .bind(now)
        .fetch_one(executor)
        .await
        .map_err(|e| conflict_on_constraint(e, format!("domain '{name}' already exists")))?;

        tracing::info!(domain_id = %domain.id, name = %domain.name, "Domain created");
        Ok(domain)
    }

    /// Fetch a domain by ID.
    pub async fn get<'e, E>(executor: E, id: &DomainId) -> Result<Option<Self>, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let domain = sqlx::query_as("SELECT * FROM domains WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(executor)
            .await?;
        Ok(domain)
    }

    /// Fetch a domain by its unique name.
    pub async fn get_by_name<'e, E>(executor: E, name: &str) -> Result<Option<Self>, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let domain = sqlx::query_as("SELECT * FROM domains WHERE name = ?")
            .bind(name)
            .fetch_optional(executor)
            .await?;
        Ok(domain)
    }

    /// List all domains ordered by name.
    pub async fn list_all<'e, E>(executor: E) -> Result<Vec<Self>, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let domains = sqlx::query_as("SELECT * FROM domains ORDER BY name")
            .fetch_all(executor)
            .await?;
        Ok(domains)
    }

    /// Apply a partial update, bumping `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if the domain does not exist,
    /// [`DbError::ValidationFailed`] for an empty replacement name, and
    /// [`DbError::Conflict`] if a replacement name is already taken.
    pub async fn update<'e, E>(
        executor: E,
        id: &DomainId,
        changes: UpdateDomain,
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
        if changes.is_default.is_some() {
            sets.push("is_default = ?");
        }
        sets.push("updated_at = ?");

        let sql = format!(
            "UPDATE domains SET {} WHERE id = ? RETURNING *",
            sets.join(", ")
        );

        let mut query = sqlx::query_as::<_, Domain>(&sql);
        if let Some(name) = name {
            query = query.bind(name.to_string());
        }
        if let Some(description) = &changes.description {
            query = query.bind(description);
        }
        if let Some(is_default) = changes.is_default {
            query = query.bind(is_default);
        }

        let domain = query
            .bind(Utc::now())
            .bind(id.as_str())
            .fetch_optional(executor)
            .await
            .map_err(|e| conflict_on_constraint(e, "domain name already exists"))?;

        domain.ok_or_else(|| DbError::NotFound {
            resource: "domain",
            id: id.to_string(),
        })
    }

    /// Delete a domain.
    ///
    /// Groups in the domain are removed by cascade; users are not, so a
    /// domain that still owns users cannot be deleted.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Conflict`] while users remain in the domain and
    /// [`DbError::NotFound`] if the domain does not exist.
    pub async fn delete(conn: &mut SqliteConnection, id: &DomainId) -> Result<(), DbError> {
        let user_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE domain_id = ?")
            .bind(id.as_str())
            .fetch_one(&mut *conn)
            .await?;

        if user_count > 0 {
            return Err(DbError::Conflict(format!(
                "domain {id} still has {user_count} user(s)"
            )));
        }

        let result = sqlx::query("DELETE FROM domains WHERE id = ?")
            .bind(id.as_str())
            .execute(&mut *conn)
            .await
            .map_err(|e| conflict_on_constraint(e, format!("domain {id} is still referenced")))?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound {
                resource: "domain",
                id: id.to_string(),
            });
        }

        tracing::info!(domain_id = %id, "Domain deleted");
        Ok(())
    }
}
