//! User property entity model.
//!
//! A flexible key-value store attached to users. Values are typed at the
//! API boundary ([`PropertyValue`]) and persisted as serialized text.

use chrono::{DateTime, Utc};
use directory_core::{PropertyId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, SqliteExecutor};

use crate::error::{conflict_on_constraint, require_non_empty, DbError};

/// A typed property value.
///
/// Strings are stored raw; every other variant is stored as its JSON text.
/// Reading a raw string that happens to parse as JSON therefore yields the
/// parsed form: a value stored as `String("true")` comes back as
/// `Boolean(true)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Boolean(bool),
    Number(serde_json::Number),
    String(String),
    /// Structured data (objects, arrays, null).
    Json(Value),
}

impl PropertyValue {
    /// Serialize for storage.
    #[must_use]
    pub fn to_stored(&self) -> String {
        match self {
            PropertyValue::String(s) => s.clone(),
            PropertyValue::Boolean(b) => b.to_string(),
            PropertyValue::Number(n) => n.to_string(),
            PropertyValue::Json(v) => v.to_string(),
        }
    }

    /// Reconstruct from a stored string.
    #[must_use]
    pub fn from_stored(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Bool(b)) => PropertyValue::Boolean(b),
            Ok(Value::Number(n)) => PropertyValue::Number(n),
            Ok(Value::String(s)) => PropertyValue::String(s),
            Ok(other) => PropertyValue::Json(other),
            Err(_) => PropertyValue::String(raw.to_string()),
        }
    }
}

impl From<Value> for PropertyValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Bool(b) => PropertyValue::Boolean(b),
            Value::Number(n) => PropertyValue::Number(n),
            Value::String(s) => PropertyValue::String(s),
            other => PropertyValue::Json(other),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

/// A key-value property attached to a user.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserProperty {
    /// Unique identifier (opaque string).
    pub id: String,

    /// The owning user.
    pub user_id: String,

    /// Property key, unique per user.
    pub key: String,

    /// Serialized value.
    pub value: Option<String>,

    /// When the property was first set.
    pub created_at: DateTime<Utc>,

    /// When the property was last overwritten.
    pub updated_at: DateTime<Utc>,
}

impl UserProperty {
    /// Get the property ID as a typed `PropertyId`.
    #[must_use]
    pub fn id(&self) -> PropertyId {
        PropertyId::from_stored(self.id.clone())
    }

    /// Get the user ID as a typed `UserId`.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        UserId::from_stored(self.user_id.clone())
    }

    /// The typed value, if one is stored.
    #[must_use]
    pub fn value(&self) -> Option<PropertyValue> {
        self.value.as_deref().map(PropertyValue::from_stored)
    }

    /// Set a property, overwriting any existing value for the key and
    /// bumping `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::ValidationFailed`] for an empty key and
    /// [`DbError::Conflict`] if the user is unknown.
    pub async fn set<'e, E>(
        executor: E,
        user_id: &UserId,
        key: &str,
        value: &PropertyValue,
    ) -> Result<Self, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let key = key.trim();
        require_non_empty("key", key)?;

        let id = PropertyId::new();
        let now = Utc::now();

        let row: UserProperty = sqlx::query_as(
            r"
            INSERT INTO user_properties (id, user_id, key, value, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            RETURNING *
            ",
        )
        .bind(id.as_str())
        .bind(user_id.as_str())
        .bind(key)
        .bind(value.to_stored())
        .bind(now)
        .bind(now)
        .fetch_one(executor)
        .await
        .map_err(|e| conflict_on_constraint(e, format!("user {user_id} is unknown")))?;

        Ok(row)
    }

    /// Fetch one property by key.
    pub async fn get<'e, E>(
        executor: E,
        user_id: &UserId,
        key: &str,
    ) -> Result<Option<Self>, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let row = sqlx::query_as("SELECT * FROM user_properties WHERE user_id = ? AND key = ?")
            .bind(user_id.as_str())
            .bind(key)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    /// List a user's properties ordered by key.
    pub async fn list_for_user<'e, E>(executor: E, user_id: &UserId) -> Result<Vec<Self>, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let rows = sqlx::query_as("SELECT * FROM user_properties WHERE user_id = ? ORDER BY key")
            .bind(user_id.as_str())
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    /// Remove a property.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if no such key is set for the user.
    pub async fn remove<'e, E>(executor: E, user_id: &UserId, key: &str) -> Result<(), DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM user_properties WHERE user_id = ? AND key = ?")
            .bind(user_id.as_str())
            .bind(key)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound {
                resource: "user property",
                id: key.to_string(),
            });
        }
        Ok(())
    }
}
