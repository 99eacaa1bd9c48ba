//! Error types for credential operations.

use thiserror::Error;

/// Credential operation error types.
///
/// Verification mismatches are not errors: `verify_stored` reports those
/// through [`crate::Verification`]. These variants cover internal failures
/// only.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// Password hashing operation failed.
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    /// Password hash format is invalid.
    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

impl AuthError {
    /// Check if this error indicates a hashing failure.
    #[must_use]
    pub fn is_hashing_failed(&self) -> bool {
        matches!(self, AuthError::HashingFailed(_))
    }
}
