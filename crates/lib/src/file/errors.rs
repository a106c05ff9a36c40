//! Error types for file uploads

use thiserror::Error;

/// Errors raised when a file payload or its hash fails validation.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FileError {
    #[error("data hash must be exactly {expected} characters, got {actual}")]
    DataHashLength { expected: usize, actual: usize },

    #[error("payload of {actual} bytes exceeds the {max} byte limit")]
    SizeLimitExceeded { max: usize, actual: usize },
}

impl FileError {
    /// Check if this error is a hash width violation.
    pub fn is_hash_length_error(&self) -> bool {
        matches!(self, FileError::DataHashLength { .. })
    }

    /// Check if this error is an exceeded upload quota.
    pub fn is_size_limit_error(&self) -> bool {
        matches!(self, FileError::SizeLimitExceeded { .. })
    }
}

impl From<FileError> for crate::Error {
    fn from(err: FileError) -> Self {
        crate::Error::File(err)
    }
}
