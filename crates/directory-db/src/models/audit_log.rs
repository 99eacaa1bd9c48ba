//! Audit log entity model.
//!
//! An append-only trail of every mutation. Rows are recorded after the
//! primary mutation has committed, so a failed audit write is logged and
//! swallowed rather than rolling anything back. Callers redact sensitive
//! fields in the change-set before recording (see [`REDACTED`]).

use chrono::{DateTime, Utc};
use directory_core::AuditLogId;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteExecutor};
use std::fmt;
use std::str::FromStr;

use crate::error::DbError;

/// Placeholder written into change-sets in place of credential material.
pub const REDACTED: &str = "[REDACTED]";

/// The kind of entity an audit entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEntityType {
    Domain,
    User,
    Role,
    Group,
}

impl AuditEntityType {
    /// The stored string form.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditEntityType::Domain => "domain",
            AuditEntityType::User => "user",
            AuditEntityType::Role => "role",
            AuditEntityType::Group => "group",
        }
    }
}

impl fmt::Display for AuditEntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AuditEntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "domain" => Ok(AuditEntityType::Domain),
            "user" => Ok(AuditEntityType::User),
            "role" => Ok(AuditEntityType::Role),
            "group" => Ok(AuditEntityType::Group),
            _ => Err(format!("Unknown audit entity type: {s}")),
        }
    }
}

/// The action an audit entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Updated,
    Deleted,
    /// A bulk membership/assignment change on the entity.
    UsersUpdated,
}

impl AuditAction {
    /// The stored string form.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Created => "created",
            AuditAction::Updated => "updated",
            AuditAction::Deleted => "deleted",
            AuditAction::UsersUpdated => "users_updated",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(AuditAction::Created),
            "updated" => Ok(AuditAction::Updated),
            "deleted" => Ok(AuditAction::Deleted),
            "users_updated" => Ok(AuditAction::UsersUpdated),
            _ => Err(format!("Unknown audit action: {s}")),
        }
    }
}

/// One immutable audit trail entry.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AuditLog {
    /// Unique identifier (opaque string).
    pub id: String,

    /// The kind of entity mutated (stored form of [`AuditEntityType`]).
    pub entity_type: String,

    /// Identifier of the mutated entity.
    pub entity_id: String,

    /// What happened (stored form of [`AuditAction`]).
    pub action: String,

    /// Serialized change-set, sensitive fields already redacted.
    pub changes: Option<String>,

    /// Who performed the mutation, if known.
    pub performed_by: Option<String>,

    /// Request origin address, if known.
    pub ip_address: Option<String>,

    /// Request user agent, if known.
    pub user_agent: Option<String>,

    /// When the entry was recorded.
    pub created_at: DateTime<Utc>,
}

/// Input for recording an audit entry.
#[derive(Debug, Clone)]
pub struct RecordAudit {
    pub entity_type: AuditEntityType,
    pub entity_id: String,
    pub action: AuditAction,
    /// Change-set; serialized before storage.
    pub changes: Option<serde_json::Value>,
    pub performed_by: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl AuditLog {
    /// Get the entry ID as a typed `AuditLogId`.
    #[must_use]
    pub fn id(&self) -> AuditLogId {
        AuditLogId::from_stored(self.id.clone())
    }

    /// The parsed change-set, if present and valid JSON.
    #[must_use]
    pub fn changes_json(&self) -> Option<serde_json::Value> {
        self.changes
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
    }

    /// Record an audit entry, swallowing storage failures.
    ///
    /// The primary mutation has already committed by the time this runs;
    /// a failed audit write must not undo it. Failures are reported via
    /// `tracing::warn!` only.
    pub async fn record<'e, E>(executor: E, entry: RecordAudit)
    where
        E: SqliteExecutor<'e>,
    {
        let entity_type = entry.entity_type;
        let entity_id = entry.entity_id.clone();
        let action = entry.action;

        if let Err(e) = Self::try_record(executor, entry).await {
            tracing::warn!(
                error = %e,
                entity_type = %entity_type,
                entity_id = %entity_id,
                action = %action,
                "Failed to record audit entry; mutation already committed"
            );
        }
    }

    /// Record an audit entry, propagating storage failures.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::QueryFailed`] if the insert fails.
    pub async fn try_record<'e, E>(executor: E, entry: RecordAudit) -> Result<Self, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let id = AuditLogId::new();
        let changes = entry.changes.as_ref().map(serde_json::Value::to_string);

        let row: AuditLog = sqlx::query_as(
            r"
            INSERT INTO audit_logs (
                id, entity_type, entity_id, action, changes,
                performed_by, ip_address, user_agent, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            ",
        )
        .bind(id.as_str())
        .bind(entry.entity_type.as_str())
        .bind(&entry.entity_id)
        .bind(entry.action.as_str())
        .bind(changes)
        .bind(&entry.performed_by)
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .bind(Utc::now())
        .fetch_one(executor)
        .await?;

        Ok(row)
    }

    /// Entries for one entity, newest first.
    ///
    /// `rowid` breaks ties between entries recorded within the same
    /// timestamp granularity.
    pub async fn get_for_entity<'e, E>(
        executor: E,
        entity_type: AuditEntityType,
        entity_id: &str,
        limit: i64,
    ) -> Result<Vec<Self>, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let rows = sqlx::query_as(
            r"
            SELECT * FROM audit_logs
            WHERE entity_type = ? AND entity_id = ?
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?
            ",
        )
        .bind(entity_type.as_str())
        .bind(entity_id)
        .bind(limit)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    /// All entries, newest first, paginated.
    pub async fn get_all<'e, E>(executor: E, limit: i64, offset: i64) -> Result<Vec<Self>, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let rows = sqlx::query_as(
            r"
            SELECT * FROM audit_logs
            ORDER BY created_at DESC, rowid DESC
            LIMIT ? OFFSET ?
            ",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    /// Total number of entries.
    pub async fn count<'e, E>(executor: E) -> Result<i64, DbError>
    where
        E: SqliteExecutor<'e>,
    {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM audit_logs")
            .fetch_one(executor)
            .await?;
        Ok(count)
    }
}
