//! Integration test helpers for directory-db.
//!
//! Tests run against an in-memory SQLite store with the full schema
//! applied, so every constraint the production store enforces is active
//! here too.

#![allow(dead_code)]

use directory_auth::PasswordHasher;
use directory_core::DomainId;
use directory_db::models::{CreateDomain, CreateUser, Domain, User};
use directory_db::{run_migrations, DbPool, Session};

/// Fresh in-memory store with migrations applied.
pub async fn setup_pool() -> DbPool {
    let pool = DbPool::connect_in_memory()
        .await
        .expect("Failed to open in-memory store");
    run_migrations(&pool).await.expect("Migrations failed");
    pool
}

/// Hasher with small parameters to keep the suite fast; production uses
/// the OWASP defaults.
pub fn fast_hasher() -> PasswordHasher {
    PasswordHasher::with_params(4096, 1, 1).expect("valid test parameters")
}

/// Create a domain with just a name.
pub async fn create_domain(session: &mut Session, name: &str) -> Domain {
    Domain::create(
        session.conn(),
        CreateDomain {
            name: name.to_string(),
            ..Default::default()
        },
    )
    .await
    .expect("Failed to create domain")
}

/// Create an active user with a pre-hashed credential.
pub async fn create_user(session: &mut Session, domain_id: &DomainId, username: &str) -> User {
    let digest = fast_hasher().hash("test-password").expect("hash");
    User::create(
        session.conn(),
        CreateUser {
            username: username.to_string(),
            password: digest,
            domain_id: domain_id.clone(),
            first_name: None,
            last_name: None,
            display_name: None,
        },
    )
    .await
    .expect("Failed to create user")
}
