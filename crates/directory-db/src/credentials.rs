//! Credential validation against stored users.
//!
//! Ties the password hasher to the user table, including the transparent
//! write-on-read upgrade of legacy plain-text credentials.

use chrono::Utc;
use directory_auth::{PasswordHasher, Verification};
use sqlx::SqliteConnection;

use crate::error::DbError;
use crate::models::User;

/// Validate a username/password pair.
///
/// Returns the matching user on success. Unknown username, wrong password
/// and inactive account all produce the same `Ok(None)`, so callers cannot
/// be used as a user-enumeration oracle.
///
/// When the stored credential is a legacy plain-text value that matched,
/// an Argon2id digest is computed and persisted in its place. Failure to
/// persist the upgrade is logged and does not fail the validation.
///
/// # Errors
///
/// Returns [`DbError::QueryFailed`] only for storage faults while looking
/// the user up.
pub async fn validate_credentials(
    conn: &mut SqliteConnection,
    username: &str,
    password: &str,
    hasher: &PasswordHasher,
) -> Result<Option<User>, DbError> {
    let Some(mut user) = User::get_by_username(&mut *conn, username).await? else {
        tracing::debug!("Credential validation failed: unknown username");
        return Ok(None);
    };

    if !user.is_active {
        tracing::debug!(user_id = %user.id, "Credential validation failed: account inactive");
        return Ok(None);
    }

    match hasher.verify_stored(password, &user.password) {
        Verification::Invalid => {
            tracing::debug!(user_id = %user.id, "Credential validation failed: wrong password");
            Ok(None)
        }
        Verification::Valid { needs_rehash: false } => Ok(Some(user)),
        Verification::Valid { needs_rehash: true } => {
            rehash_credential(conn, &mut user, password, hasher).await;
            Ok(Some(user))
        }
    }
}

/// Upgrade a matched legacy credential to an Argon2id digest.
///
/// Best effort: the validation already succeeded, so hashing or persistence
/// failures only produce a warning and leave the stored value untouched.
async fn rehash_credential(
    conn: &mut SqliteConnection,
    user: &mut User,
    password: &str,
    hasher: &PasswordHasher,
) {
    let digest = match hasher.hash(password) {
        Ok(digest) => digest,
        Err(e) => {
            tracing::warn!(user_id = %user.id, error = %e, "Credential rehash failed; keeping legacy value");
            return;
        }
    };

    let result = sqlx::query("UPDATE users SET password = ?, updated_at = ? WHERE id = ?")
        .bind(&digest)
        .bind(Utc::now())
        .bind(&user.id)
        .execute(conn)
        .await;

    match result {
        Ok(_) => {
            tracing::info!(user_id = %user.id, "Legacy credential upgraded to Argon2id");
            user.password = digest;
        }
        Err(e) => {
            tracing::warn!(user_id = %user.id, error = %e, "Failed to persist rehashed credential");
        }
    }
}
