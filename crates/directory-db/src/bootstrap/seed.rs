//! Legacy user import.
//!
//! Reads the JSON user file shipped with older deployments (an array of
//! OIDC-style profile records) and creates each user at most once. Records
//! whose username or email already exists are skipped; a record that fails
//! to import is logged and does not abort the rest of the file.

use std::path::Path;

use directory_auth::PasswordHasher;
use directory_core::DomainId;
use serde::Deserialize;
use serde_json::{Map, Value};
use sqlx::SqliteConnection;

use super::{BootstrapError, ADMIN_USERNAME, DEFAULT_IMPORT_PASSWORD};
use crate::error::DbError;
use crate::models::{
    AddEmail, CreateUser, PropertyValue, Role, User, UserEmail, UserProperty, UserRole,
};

/// OIDC profile claims copied into user properties when present.
const OIDC_PROFILE_KEYS: &[&str] = &[
    "address",
    "birthdate",
    "email_verified",
    "gender",
    "locale",
    "middle_name",
    "nickname",
    "phone_number",
    "phone_number_verified",
    "picture",
    "profile",
    "updated_at",
    "website",
    "zoneinfo",
];

/// One record of the legacy user file.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyUserRecord {
    pub email: Option<String>,
    pub preferred_username: Option<String>,
    pub password: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub name: Option<String>,

    /// Remaining claims, mined for OIDC profile properties.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LegacyUserRecord {
    /// The username this record maps to: the email, falling back to
    /// `preferred_username`.
    fn username(&self) -> Option<&str> {
        self.email
            .as_deref()
            .or(self.preferred_username.as_deref())
            .filter(|s| !s.trim().is_empty())
    }

    fn display_name(&self) -> Option<String> {
        if let Some(name) = &self.name {
            return Some(name.clone());
        }
        let combined = format!(
            "{} {}",
            self.given_name.as_deref().unwrap_or(""),
            self.family_name.as_deref().unwrap_or("")
        );
        let combined = combined.trim();
        if combined.is_empty() {
            None
        } else {
            Some(combined.to_string())
        }
    }
}

/// Import every record of the legacy user file, returning
/// `(imported, skipped)` counts.
pub(super) async fn import_legacy_users(
    conn: &mut SqliteConnection,
    path: &Path,
    domain_id: &DomainId,
) -> Result<(usize, usize), BootstrapError> {
    let raw = std::fs::read_to_string(path).map_err(BootstrapError::ImportFileRead)?;
    let records: Vec<LegacyUserRecord> =
        serde_json::from_str(&raw).map_err(BootstrapError::ImportFileParse)?;

    tracing::info!(path = %path.display(), records = records.len(), "Importing legacy users");

    let hasher = PasswordHasher::new();
    let mut imported = 0;
    let mut skipped = 0;

    for record in records {
        match import_record(conn, &hasher, domain_id, &record).await {
            Ok(true) => imported += 1,
            Ok(false) => skipped += 1,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    username = record.username().unwrap_or("<none>"),
                    "Failed to import legacy user record; continuing"
                );
                skipped += 1;
            }
        }
    }

    tracing::info!(imported, skipped, "Legacy user import finished");
    Ok((imported, skipped))
}

/// Import one record. `Ok(false)` means the record was skipped.
async fn import_record(
    conn: &mut SqliteConnection,
    hasher: &PasswordHasher,
    domain_id: &DomainId,
    record: &LegacyUserRecord,
) -> Result<bool, DbError> {
    let Some(username) = record.username() else {
        tracing::warn!("Legacy record has neither email nor preferred_username; skipping");
        return Ok(false);
    };
    let username = username.to_string();

    if User::get_by_username(&mut *conn, &username).await?.is_some() {
        tracing::info!(username = %username, "Legacy user already exists; skipping");
        return Ok(false);
    }
    if let Some(email) = &record.email {
        if UserEmail::find_by_address(&mut *conn, email).await?.is_some() {
            tracing::info!(email = %email, "Legacy email already registered; skipping");
            return Ok(false);
        }
    }

    let plaintext = record.password.as_deref().unwrap_or(DEFAULT_IMPORT_PASSWORD);
    let digest = hasher.hash(plaintext).map_err(|e| DbError::ValidationFailed {
        field: "password",
        message: e.to_string(),
    })?;

    let user = User::create(
        &mut *conn,
        CreateUser {
            username: username.clone(),
            password: digest,
            domain_id: domain_id.clone(),
            first_name: record.given_name.clone(),
            last_name: record.family_name.clone(),
            display_name: record.display_name(),
        },
    )
    .await?;
    let user_id = user.id();

    if let Some(email) = &record.email {
        let verified = record
            .extra
            .get("email_verified")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        UserEmail::add(
            &mut *conn,
            AddEmail {
                user_id: user_id.clone(),
                email: email.clone(),
                is_primary: true,
                is_verified: verified,
            },
        )
        .await?;
    }

    for key in OIDC_PROFILE_KEYS {
        if let Some(value) = record.extra.get(*key) {
            let value = PropertyValue::from(value.clone());
            UserProperty::set(&mut *conn, &user_id, key, &value).await?;
        }
    }

    let role_name = if username == ADMIN_USERNAME { "admin" } else { "user" };
    let role = Role::get_by_name(&mut *conn, role_name)
        .await?
        .ok_or_else(|| DbError::NotFound {
            resource: "role",
            id: role_name.to_string(),
        })?;
    UserRole::assign(&mut *conn, &user_id, &role.id()).await?;

    tracing::info!(username = %username, role = role_name, "Seeded legacy user");
    Ok(true)
}
