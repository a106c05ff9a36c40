//! Error types for the user system

use thiserror::Error;

/// Errors raised by [`User`](super::User) validation and login.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UserError {
    #[error("name is too long (at most {max} characters, got {actual})")]
    NameTooLong { max: usize, actual: usize },

    #[error("password hash must be exactly {expected} characters, got {actual}")]
    PasswordHashLength { expected: usize, actual: usize },

    #[error("user name already exists: {name}")]
    NameAlreadyExists { name: String },

    #[error("user not found: {name}")]
    NameNotFound { name: String },

    #[error("password hash does not match")]
    CredentialMismatch,
}

impl UserError {
    /// Check if this error is a string length violation.
    pub fn is_length_error(&self) -> bool {
        matches!(self, UserError::NameTooLong { .. })
    }

    /// Check if this error is a hash width violation.
    pub fn is_hash_length_error(&self) -> bool {
        matches!(self, UserError::PasswordHashLength { .. })
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, UserError::NameNotFound { .. })
    }

    /// Check if this error indicates a conflict (already exists).
    pub fn is_conflict(&self) -> bool {
        matches!(self, UserError::NameAlreadyExists { .. })
    }

    /// Check if this error is an authentication failure.
    pub fn is_credential_mismatch(&self) -> bool {
        matches!(self, UserError::CredentialMismatch)
    }
}

impl From<UserError> for crate::Error {
    fn from(err: UserError) -> Self {
        crate::Error::User(err)
    }
}
