//! Store Bootstrap Module
//!
//! Brings a fresh (or existing) store to its baseline state: schema
//! migrated, the default `localhost` domain present, the baseline roles
//! present, and, optionally, users imported from a legacy JSON file. The
//! whole process is idempotent; running it on every start is the intended
//! usage.
//!
//! ```rust,ignore
//! use directory_db::bootstrap::{initialize, BootstrapOptions};
//!
//! let result = initialize(&pool, &BootstrapOptions::default()).await?;
//! if result.domain_created {
//!     tracing::info!("Default domain created");
//! }
//! ```

mod seed;

pub use seed::LegacyUserRecord;

use std::path::PathBuf;

use thiserror::Error;

use crate::error::DbError;
use crate::migrations::run_migrations;
use crate::models::{CreateDomain, Domain, Role};
use crate::pool::DbPool;
use crate::session::Session;

/// Name of the default domain every store starts with.
pub const DEFAULT_DOMAIN_NAME: &str = "localhost";

/// Description of the default domain.
pub const DEFAULT_DOMAIN_DESCRIPTION: &str = "Default localhost domain";

/// Baseline roles as `(name, description)`, upserted by name.
pub const DEFAULT_ROLES: &[(&str, &str)] = &[
    ("admin", "Administrator with full access"),
    ("user", "Standard user"),
    ("guest", "Guest user with limited access"),
];

/// Username that receives the `admin` role during legacy import.
pub const ADMIN_USERNAME: &str = "admin@localhost";

/// Password assigned to imported records that carry none.
pub const DEFAULT_IMPORT_PASSWORD: &str = "ChangeMe123!";

/// Errors that can occur during the bootstrap process.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// A storage operation failed while bootstrapping.
    #[error("Database error during bootstrap: {0}")]
    Database(#[from] DbError),

    /// The legacy import file could not be read.
    #[error("Failed to read import file: {0}")]
    ImportFileRead(#[source] std::io::Error),

    /// The legacy import file is not valid JSON of the expected shape.
    #[error("Failed to parse import file: {0}")]
    ImportFileParse(#[source] serde_json::Error),
}

/// What to bootstrap beyond the baseline domain and roles.
#[derive(Debug, Clone, Default)]
pub struct BootstrapOptions {
    /// Legacy user file to import, if any.
    pub import_file: Option<PathBuf>,
}

/// Outcome of a bootstrap run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapResult {
    /// Whether the default domain was created (false: already present).
    pub domain_created: bool,

    /// How many baseline roles were created this run.
    pub roles_created: usize,

    /// How many legacy users were imported this run.
    pub users_imported: usize,

    /// How many legacy records were skipped (already present or invalid).
    pub users_skipped: usize,
}

/// Bring the store to its baseline state.
///
/// Runs migrations, ensures the default domain and baseline roles exist,
/// then imports the legacy user file if one was given. Safe to call
/// repeatedly: a second run changes nothing.
///
/// # Errors
///
/// Migration and baseline failures are fatal. Per-record import failures
/// are not: they are logged, counted as skipped, and the rest of the file
/// is still processed.
pub async fn initialize(
    pool: &DbPool,
    options: &BootstrapOptions,
) -> Result<BootstrapResult, BootstrapError> {
    tracing::info!("Starting store bootstrap");

    run_migrations(pool).await?;

    let mut session = Session::open(pool).await?;
    let conn = session.conn();

    let mut result = BootstrapResult::default();

    let domain = match Domain::get_by_name(&mut *conn, DEFAULT_DOMAIN_NAME).await? {
        Some(domain) => domain,
        None => {
            let domain = Domain::create(
                &mut *conn,
                CreateDomain {
                    name: DEFAULT_DOMAIN_NAME.to_string(),
                    description: Some(DEFAULT_DOMAIN_DESCRIPTION.to_string()),
                    is_default: true,
                },
            )
            .await?;
            result.domain_created = true;
            tracing::info!(domain_id = %domain.id, "Created default domain");
            domain
        }
    };

    for (name, description) in DEFAULT_ROLES.iter().copied() {
        if Role::get_by_name(&mut *conn, name).await?.is_none() {
            Role::create(&mut *conn, name, Some(description)).await?;
            result.roles_created += 1;
            tracing::info!(role = name, "Created baseline role");
        }
    }

    if let Some(path) = &options.import_file {
        let (imported, skipped) = seed::import_legacy_users(conn, path, &domain.id()).await?;
        result.users_imported = imported;
        result.users_skipped = skipped;
    }

    tracing::info!(
        domain_created = result.domain_created,
        roles_created = result.roles_created,
        users_imported = result.users_imported,
        users_skipped = result.users_skipped,
        "Store bootstrap completed"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_role_constants() {
        let names: Vec<&str> = DEFAULT_ROLES.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["admin", "user", "guest"]);
    }

    #[test]
    fn test_default_domain_constants() {
        assert_eq!(DEFAULT_DOMAIN_NAME, "localhost");
        assert!(ADMIN_USERNAME.ends_with(DEFAULT_DOMAIN_NAME));
    }
}
