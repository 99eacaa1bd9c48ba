//! Entity models for the directory store.
//!
//! Each model owns its table: the row struct, input/update structs, and the
//! async repository operations over it.

pub mod audit_log;
pub mod domain;
pub mod group;
pub mod property_key;
pub mod role;
pub mod user;
pub mod user_email;
pub mod user_group;
pub mod user_property;
pub mod user_role;

pub use audit_log::{AuditAction, AuditEntityType, AuditLog, RecordAudit, REDACTED};
pub use domain::{CreateDomain, Domain, UpdateDomain};
pub use group::{CreateGroup, Group, UpdateGroup};
pub use property_key::{PropertyKeyInfo, STANDARD_KEYS};
pub use role::{Role, UpdateRole};
pub use user::{CreateUser, UpdateUser, User, UserDetails};
pub use user_email::{AddEmail, UserEmail};
pub use user_group::UserGroup;
pub use user_property::{PropertyValue, UserProperty};
pub use user_role::UserRole;
