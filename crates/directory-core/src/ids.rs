//! Strongly Typed Identifiers
//!
//! This module provides type-safe identifier types for the directory
//! service. Every entity identifier is an opaque unique string (a UUID v4
//! generated at creation, persisted as TEXT). The newtype pattern prevents
//! accidental misuse of different ID types at compile time.
//!
//! # Example
//!
//! ```
//! use directory_core::{DomainId, UserId};
//!
//! let domain = DomainId::new();
//! let user = UserId::new();
//!
//! // Type safety: cannot pass UserId where DomainId is expected
//! fn requires_domain(id: &DomainId) -> String {
//!     id.to_string()
//! }
//!
//! let result = requires_domain(&domain);
//! // requires_domain(&user); // This would not compile!
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Error type for ID parsing failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse
    pub id_type: &'static str,
    /// The underlying UUID parse error message
    pub message: String,
}

impl Display for ParseIdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to parse {}: {}", self.id_type, self.message)
    }
}

impl std::error::Error for ParseIdError {}

/// Macro to define a strongly-typed ID type backed by its stored string form.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new random ID using UUID v4.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Wraps an already-stored identifier without re-validating it.
            ///
            /// Intended for converting a row's TEXT column back into a typed
            /// ID; use `FromStr` for untrusted input.
            #[must_use]
            pub fn from_stored(id: String) -> Self {
                Self(id)
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the ID, returning the underlying string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Uuid::parse_str(s)
                    .map(|u| Self(u.to_string()))
                    .map_err(|e| ParseIdError {
                        id_type: stringify!($name),
                        message: e.to_string(),
                    })
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// Strongly typed identifier for domains.
    ///
    /// A domain is the partition owning users and groups.
    DomainId
);

define_id!(
    /// Strongly typed identifier for users.
    UserId
);

define_id!(
    /// Strongly typed identifier for user email rows.
    EmailId
);

define_id!(
    /// Strongly typed identifier for user property rows.
    PropertyId
);

define_id!(
    /// Strongly typed identifier for roles.
    RoleId
);

define_id!(
    /// Strongly typed identifier for groups.
    GroupId
);

define_id!(
    /// Strongly typed identifier for audit log entries.
    AuditLogId
);
