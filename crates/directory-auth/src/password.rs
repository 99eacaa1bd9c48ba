//! Password hashing with Argon2id.
//!
//! Provides secure password hashing and verification using Argon2id
//! with OWASP-recommended parameters, plus a compatibility path for
//! legacy plain-text credentials that signals when the stored value
//! should be transparently re-hashed.

use crate::error::AuthError;
use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

/// Outcome of verifying a plaintext password against a stored credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// The password matches the stored credential.
    Valid {
        /// True when the stored credential is a legacy plain-text value and
        /// the caller should persist an upgraded Argon2id digest
        /// (write-on-read migration).
        needs_rehash: bool,
    },
    /// The password does not match.
    Invalid,
}

impl Verification {
    /// Check whether the credential matched.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Verification::Valid { .. })
    }
}

/// Password hasher configuration.
///
/// Uses OWASP 2024 recommended parameters for Argon2id:
/// - Memory: 19456 KiB (19 MiB)
/// - Iterations: 2
/// - Parallelism: 1
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher {
    /// Create a new password hasher with OWASP-recommended parameters.
    #[must_use]
    pub fn new() -> Self {
        // OWASP 2024 recommended parameters: m=19456 (19 MiB), t=2, p=1.
        let params = Params::new(19456, 2, 1, None)
            .expect("OWASP 2024 Argon2 parameters are valid constants");

        Self { params }
    }

    /// Create a password hasher with custom parameters.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::HashingFailed`] if parameters are invalid.
    pub fn with_params(
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
    ) -> Result<Self, AuthError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| AuthError::HashingFailed(format!("Invalid parameters: {e}")))?;

        Ok(Self { params })
    }

    /// Hash a password using Argon2id.
    ///
    /// Returns a PHC-formatted hash string. Each call salts independently,
    /// so the same input never produces the same digest twice.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::HashingFailed`] if hashing fails.
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());

        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashingFailed(format!("Hashing failed: {e}")))?;

        Ok(hash.to_string())
    }

    /// Verify a password against a PHC-formatted Argon2 hash.
    ///
    /// Returns `Ok(true)` if the password matches, `Ok(false)` if not.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidHashFormat`] if the hash format is invalid.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidHashFormat)?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());

        match argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(_) => Ok(false), // Other errors also treated as non-match
        }
    }

    /// Verify a password against a stored credential of either form.
    ///
    /// Stored credentials come in two shapes for backward compatibility:
    /// a PHC-formatted Argon2 digest written by [`PasswordHasher::hash`],
    /// or a legacy plain-text value imported from an older deployment.
    /// A legacy match reports `needs_rehash: true` so the caller can
    /// persist the upgraded digest.
    #[must_use]
    pub fn verify_stored(&self, password: &str, stored: &str) -> Verification {
        if is_phc_digest(stored) {
            match self.verify(password, stored) {
                Ok(true) => Verification::Valid {
                    needs_rehash: false,
                },
                Ok(false) | Err(_) => Verification::Invalid,
            }
        } else if !stored.is_empty() && constant_time_eq(password.as_bytes(), stored.as_bytes()) {
            Verification::Valid { needs_rehash: true }
        } else {
            Verification::Invalid
        }
    }
}

/// Whether a stored credential looks like a PHC-formatted digest.
fn is_phc_digest(stored: &str) -> bool {
    stored.starts_with("$argon2")
}

/// Byte-wise comparison that does not short-circuit on the first mismatch.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Hash a password using Argon2id with OWASP-recommended parameters.
///
/// Convenience function using the default [`PasswordHasher`].
///
/// # Errors
///
/// Returns [`AuthError::HashingFailed`] if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    PasswordHasher::new().hash(password)
}

/// Verify a password against an Argon2id hash.
///
/// Convenience function using the default [`PasswordHasher`].
///
/// # Errors
///
/// Returns [`AuthError::InvalidHashFormat`] if the hash format is invalid.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    PasswordHasher::new().verify(password, hash)
}

/// Verify a password against a stored credential of either form.
///
/// Convenience function using the default [`PasswordHasher`].
#[must_use]
pub fn verify_stored(password: &str, stored: &str) -> Verification {
    PasswordHasher::new().verify_stored(password, stored)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Small parameters keep the test suite fast; production uses the
    // OWASP defaults in PasswordHasher::new().
    fn test_hasher() -> PasswordHasher {
        PasswordHasher::with_params(4096, 1, 1).unwrap()
    }

    #[test]
    fn test_hash_password_returns_argon2id() {
        let hash = test_hasher().hash("test-password").unwrap();
        assert!(hash.starts_with("$argon2id$"));
    }

    #[test]
    fn test_verify_password_correct() {
        let hasher = test_hasher();
        let password = "correct-password";
        let hash = hasher.hash(password).unwrap();

        assert!(hasher.verify(password, &hash).unwrap());
    }

    #[test]
    fn test_verify_password_incorrect() {
        let hasher = test_hasher();
        let hash = hasher.hash("correct-password").unwrap();

        assert!(!hasher.verify("wrong-password", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash_format() {
        let result = verify_password("password", "not-a-valid-hash");

        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), AuthError::InvalidHashFormat));
    }

    #[test]
    fn test_hash_is_self_salting() {
        let hasher = test_hasher();
        let password = "same-password";
        let hash1 = hasher.hash(password).unwrap();
        let hash2 = hasher.hash(password).unwrap();

        // Same password must produce different digests (different salts)
        assert_ne!(hash1, hash2);

        // But both verify correctly
        assert!(hasher.verify(password, &hash1).unwrap());
        assert!(hasher.verify(password, &hash2).unwrap());
    }

    #[test]
    fn test_verify_stored_against_digest() {
        let hasher = test_hasher();
        let hash = hasher.hash("secret").unwrap();

        assert_eq!(
            hasher.verify_stored("secret", &hash),
            Verification::Valid {
                needs_rehash: false
            }
        );
        assert_eq!(hasher.verify_stored("wrong", &hash), Verification::Invalid);
    }

    #[test]
    fn test_verify_stored_against_legacy_plaintext() {
        let hasher = test_hasher();

        assert_eq!(
            hasher.verify_stored("hunter2", "hunter2"),
            Verification::Valid { needs_rehash: true }
        );
        assert_eq!(
            hasher.verify_stored("hunter2", "different"),
            Verification::Invalid
        );
    }

    #[test]
    fn test_verify_stored_empty_stored_never_matches() {
        let hasher = test_hasher();
        assert_eq!(hasher.verify_stored("", ""), Verification::Invalid);
        assert_eq!(hasher.verify_stored("anything", ""), Verification::Invalid);
    }

    #[test]
    fn test_verification_is_valid() {
        assert!(Verification::Valid { needs_rehash: true }.is_valid());
        assert!(Verification::Valid {
            needs_rehash: false
        }
        .is_valid());
        assert!(!Verification::Invalid.is_valid());
    }

    #[test]
    fn test_unicode_password() {
        let hasher = test_hasher();
        let password = "пароль日本語🔐";
        let hash = hasher.hash(password).unwrap();

        assert!(hasher.verify(password, &hash).unwrap());
        assert!(!hasher.verify("wrong", &hash).unwrap());
    }

    #[test]
    fn test_hash_format_contains_params() {
        let hash = test_hasher().hash("test").unwrap();

        // PHC format includes algorithm and parameters,
        // e.g. $argon2id$v=19$m=4096,t=1,p=1$...
        assert!(hash.contains("v=19"));
        assert!(hash.contains("m=4096"));
        assert!(hash.contains("t=1"));
        assert!(hash.contains("p=1"));
    }
}
