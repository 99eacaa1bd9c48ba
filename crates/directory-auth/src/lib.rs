//! Password hashing and credential verification for the directory service.
//!
//! This crate provides:
//! - Argon2id password hashing with OWASP-recommended parameters
//! - Verification against stored credentials, including legacy plain-text
//!   values carried over from older deployments, with a rehash-needed signal
//!   so callers can transparently upgrade the stored digest
//!
//! # Example
//!
//! ```rust
//! use directory_auth::{hash_password, verify_stored, Verification};
//!
//! let digest = hash_password("my-secure-password").unwrap();
//! assert!(digest.starts_with("$argon2id$"));
//!
//! match verify_stored("my-secure-password", &digest) {
//!     Verification::Valid { needs_rehash } => assert!(!needs_rehash),
//!     Verification::Invalid => panic!("expected a match"),
//! }
//!
//! // A legacy plain-text credential still verifies, but asks for an upgrade.
//! assert_eq!(
//!     verify_stored("hunter2", "hunter2"),
//!     Verification::Valid { needs_rehash: true }
//! );
//! ```

mod error;
mod password;

pub use error::AuthError;
pub use password::{hash_password, verify_password, verify_stored, PasswordHasher, Verification};
