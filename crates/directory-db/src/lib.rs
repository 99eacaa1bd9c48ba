//! Storage layer for the directory service.
//!
//! This crate provides:
//! - Connection pool management and embedded schema migrations ([`DbPool`],
//!   [`run_migrations`])
//! - A request-scoped [`Session`] pinning one pooled connection per request
//! - Entity repositories under [`models`]: domains, users, emails,
//!   properties, roles, groups, their join tables, and the append-only
//!   audit trail
//! - Credential validation with transparent legacy-hash migration
//!   ([`credentials::validate_credentials`])
//! - Idempotent store bootstrap and legacy user import ([`bootstrap`])
//!
//! # Example
//!
//! ```rust,ignore
//! use directory_db::{bootstrap, DbPool, Session};
//! use directory_db::models::{CreateDomain, Domain};
//!
//! let pool = DbPool::connect("/var/lib/directory/users.db").await?;
//! bootstrap::initialize(&pool, &bootstrap::BootstrapOptions::default()).await?;
//!
//! let mut session = Session::open(&pool).await?;
//! let domain = Domain::create(
//!     session.conn(),
//!     CreateDomain { name: "acme".into(), ..Default::default() },
//! )
//! .await?;
//! ```

pub mod bootstrap;
pub mod credentials;
pub mod error;
pub mod migrations;
pub mod models;
pub mod pool;
pub mod session;

pub use credentials::validate_credentials;
pub use error::DbError;
pub use migrations::run_migrations;
pub use pool::DbPool;
pub use session::Session;
