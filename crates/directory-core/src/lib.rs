//! Directory service core library.
//!
//! Shared types for the directory service crates.
//!
//! # Modules
//!
//! - [`ids`] - Strongly typed identifiers (DomainId, UserId, RoleId, ...)
//!
//! # Example
//!
//! ```
//! use directory_core::{DomainId, UserId};
//!
//! let domain_id = DomainId::new();
//! let user_id = UserId::new();
//! assert_ne!(domain_id.as_str(), user_id.as_str());
//! ```

pub mod ids;

pub use ids::{AuditLogId, DomainId, EmailId, GroupId, ParseIdError, PropertyId, RoleId, UserId};
