//! User entity model.
//!
//! Users belong to exactly one domain and carry a stored credential (an
//! Argon2id digest, or a legacy plain-text value awaiting migration). The
//! credential is never serialized outward.

use chrono::{DateTime, Utc};
use directory_core::{DomainId, UserId};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection, SqliteExecutor};

use crate::error::{conflict_on_constraint, require_non_empty, DbError};
use crate::models::{Group, Role, UserEmail, UserGroup, UserProperty, UserRole};

/// A directory user.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier (opaque string).
    pub id: String,

    /// Login name, unique across all domains.
    pub username: String,

    /// Stored credential. Never serialized.
    #[serde(skip_serializing, default)]
    pub password: String,

    /// Given name.
    pub first_name: Option<String>,

    /// Family name.
    pub last_name: Option<String>,

    /// Display name shown in listings.
    pub display_name: Option<String>,

    /// The domain this user belongs to.
    pub domain_id: String,

    /// Whether the account may authenticate.
    pub is_active: bool,

    /// When the user was created.
    pub created_at: DateTime<Utc>,

    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a user.
///
/// `password` is the value to store as-is; callers hash plaintext
/// credentials with `directory_auth` before constructing this.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub password: String,
    pub domain_id: DomainId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: Option<String>,
}

/// Partial update for a user. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: Option<String>,
    pub domain_id: Option<DomainId>,
    pub is_active: Option<bool>,
}

/// A user with all of its associated records attached.
#[derive(Debug, Clone, Serialize)]
pub struct UserDetails {
    #[serde(flatten)]
    pub user: User,
    pub emails: Vec<UserEmail>,
    pub properties: Vec<UserProperty>,
    pub roles: Vec<Role>,
    pub groups: Vec<Group>,
}

impl User {
    /// Get the user ID as a typed `UserId`.
    #[must_use]
    pub fn id(&self) -> UserId {
        UserId::from_stored(self.id.clone())
    }

    /// Get the domain ID as a typed `DomainId`.
    #[must_use]
    pub fn domain_id(&self) -> DomainId {
        DomainId::from_stored(self.domain_id.clone())
    }

    /// Create a new user.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::ValidationFailed`] for an empty username or
    /// credential and [`DbError::Conflict`] if the username is taken or the
    /// domain does not exist.
    pub async fn create<'e, E>(executor: E, input: CreateUser) -> Result<Self, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let username = input.username.trim();
        require_non_empty("username", username)?;
        require_non_empty("password", &input.password)?;

        let id = UserId::new();
        let now = Utc::now();

        let user: User = sqlx::query_as(
            r"
            INSERT INTO users (
                id, username, password, first_name, last_name,
                display_name, domain_id, is_active, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?, ?)
            RETURNING *
            ",
        )
        .bind(id.as_str())
        .bind(username)
        .bind(&input.password)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.display_name)
        .bind(input.domain_id.as_str())
        .bind(now)
        .bind(now)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            conflict_on_constraint(
                e,
                format!("username '{username}' already exists or domain is unknown"),
            )
        })?;

        tracing::info!(user_id = %user.id, username = %user.username, "User created");
        Ok(user)
    }

    /// Fetch a user by ID.
    pub async fn get<'e, E>(executor: E, id: &UserId) -> Result<Option<Self>, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let user = sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(executor)
            .await?;
        Ok(user)
    }

    /// Fetch a user by its unique username.
    pub async fn get_by_username<'e, E>(executor: E, username: &str) -> Result<Option<Self>, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let user = sqlx::query_as("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(executor)
            .await?;
        Ok(user)
    }

    /// Fetch the user owning a given email address.
    pub async fn get_by_email<'e, E>(executor: E, email: &str) -> Result<Option<Self>, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let user = sqlx::query_as(
            r"
            SELECT u.* FROM users u
            JOIN user_emails e ON e.user_id = u.id
            WHERE e.email = ?
            ",
        )
        .bind(email)
        .fetch_optional(executor)
        .await?;
        Ok(user)
    }

    /// List all users ordered by username.
    pub async fn list_all<'e, E>(executor: E) -> Result<Vec<Self>, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let users = sqlx::query_as("SELECT * FROM users ORDER BY username")
            .fetch_all(executor)
            .await?;
        Ok(users)
    }

    /// List users in one domain ordered by username.
    pub async fn list_by_domain<'e, E>(
        executor: E,
        domain_id: &DomainId,
    ) -> Result<Vec<Self>, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let users = sqlx::query_as("SELECT * FROM users WHERE domain_id = ? ORDER BY username")
            .bind(domain_id.as_str())
            .fetch_all(executor)
            .await?;
        Ok(users)
    }

    /// Apply a partial update, bumping `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if the user does not exist,
    /// [`DbError::ValidationFailed`] for empty replacement values, and
    /// [`DbError::Conflict`] if a replacement username is taken or a
    /// replacement domain is unknown.
    pub async fn update<'e, E>(
        executor: E,
        id: &UserId,
        changes: UpdateUser,
    ) -> Result<Self, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let username = changes.username.as_deref().map(str::trim);
        if let Some(username) = username {
            require_non_empty("username", username)?;
        }
        if let Some(password) = &changes.password {
            require_non_empty("password", password)?;
        }

        let mut sets = Vec::new();
        if username.is_some() {
            sets.push("username = ?");
        }
        if changes.password.is_some() {
            sets.push("password = ?");
        }
        if changes.first_name.is_some() {
            sets.push("first_name = ?");
        }
        if changes.last_name.is_some() {
            sets.push("last_name = ?");
        }
        if changes.display_name.is_some() {
            sets.push("display_name = ?");
        }
        if changes.domain_id.is_some() {
            sets.push("domain_id = ?");
        }
        if changes.is_active.is_some() {
            sets.push("is_active = ?");
        }
        sets.push("updated_at = ?");

        let sql = format!("UPDATE users SET {} WHERE id = ? RETURNING *", sets.join(", "));

        let mut query = sqlx::query_as::<_, User>(&sql);
        if let Some(username) = username {
            query = query.bind(username.to_string());
        }
        if let Some(password) = &changes.password {
            query = query.bind(password);
        }
        if let Some(first_name) = &changes.first_name {
            query = query.bind(first_name);
        }
        if let Some(last_name) = &changes.last_name {
            query = query.bind(last_name);
        }
        if let Some(display_name) = &changes.display_name {
            query = query.bind(display_name);
        }
        if let Some(domain_id) = &changes.domain_id {
            query = query.bind(domain_id.as_str().to_string());
        }
        if let Some(is_active) = changes.is_active {
            query = query.bind(is_active);
        }

        let user = query
            .bind(Utc::now())
            .bind(id.as_str())
            .fetch_optional(executor)
            .await
            .map_err(|e| {
                conflict_on_constraint(e, "username already exists or domain is unknown")
            })?;

        user.ok_or_else(|| DbError::NotFound {
            resource: "user",
            id: id.to_string(),
        })
    }

    /// Delete a user. Emails, properties, role assignments and group
    /// memberships are removed by cascade.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if the user does not exist.
    pub async fn delete<'e, E>(executor: E, id: &UserId) -> Result<(), DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id.as_str())
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound {
                resource: "user",
                id: id.to_string(),
            });
        }

        tracing::info!(user_id = %id, "User deleted");
        Ok(())
    }

    /// Fetch a user with all associated records (emails, properties, roles,
    /// groups). Runs a bounded number of queries (five).
    pub async fn get_details(
        conn: &mut SqliteConnection,
        id: &UserId,
    ) -> Result<Option<UserDetails>, DbError> {
        let Some(user) = Self::get(&mut *conn, id).await? else {
            return Ok(None);
        };
        Ok(Some(Self::load_details(conn, user).await?))
    }

    /// Like [`User::get_details`], looked up by username.
    pub async fn get_details_by_username(
        conn: &mut SqliteConnection,
        username: &str,
    ) -> Result<Option<UserDetails>, DbError> {
        let Some(user) = Self::get_by_username(&mut *conn, username).await? else {
            return Ok(None);
        };
        Ok(Some(Self::load_details(conn, user).await?))
    }

    /// Like [`User::get_details`], looked up by any registered email address.
    pub async fn get_details_by_email(
        conn: &mut SqliteConnection,
        email: &str,
    ) -> Result<Option<UserDetails>, DbError> {
        let Some(user) = Self::get_by_email(&mut *conn, email).await? else {
            return Ok(None);
        };
        Ok(Some(Self::load_details(conn, user).await?))
    }

    async fn load_details(
        conn: &mut SqliteConnection,
        user: User,
    ) -> Result<UserDetails, DbError> {
        let id = user.id();
        let emails = UserEmail::list_for_user(&mut *conn, &id).await?;
        let properties = UserProperty::list_for_user(&mut *conn, &id).await?;
        let roles = UserRole::roles_for_user(&mut *conn, &id).await?;
        let groups = UserGroup::groups_for_user(&mut *conn, &id).await?;

        Ok(UserDetails {
            user,
            emails,
            properties,
            roles,
            groups,
        })
    }
}
