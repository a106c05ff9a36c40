//! Backend error types for purrcafe storage.
//!
//! This module defines structured error types for statement execution,
//! persistence and schema handling.

use thiserror::Error;

use crate::MeowId;

/// Errors that can occur during backend operations.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Existing variants will not be removed in minor versions
/// - Field additions/changes require a major version bump
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BackendError {
    /// A statement named a column the table does not have.
    #[error("Unknown column '{column}' in table {table}")]
    UnknownColumn {
        /// The table the statement targeted
        table: &'static str,
        /// The offending column name
        column: String,
    },

    /// An insert reused an identifier that already has a row.
    #[error("Duplicate key {id} in table {table}")]
    DuplicateKey {
        /// The table the insert targeted
        table: &'static str,
        /// The identifier that already exists
        id: MeowId,
    },

    /// A column value had a different type than the reader expected.
    #[error("Type mismatch: expected {expected}, found {actual}")]
    TypeMismatch {
        /// The type the reader asked for
        expected: &'static str,
        /// The type that was stored
        actual: &'static str,
    },

    /// A value had the right type but an unusable content.
    #[error("Invalid value: {reason}")]
    InvalidValue {
        /// Description of the problem
        reason: String,
    },

    /// A persisted row could not be restored.
    #[error("Invalid row in table {table}: {reason}")]
    InvalidRow {
        /// The table the row belongs to
        table: &'static str,
        /// Description of the problem
        reason: String,
    },

    /// Serialization failed.
    #[error("Serialization failed")]
    SerializationFailed {
        /// The underlying serialization error
        #[source]
        source: serde_json::Error,
    },

    /// Deserialization failed.
    #[error("Deserialization failed")]
    DeserializationFailed {
        /// The underlying deserialization error
        #[source]
        source: serde_json::Error,
    },

    /// File I/O error.
    #[error("File I/O error")]
    FileIo {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// SQL database error from sqlx.
    #[cfg(feature = "sqlite")]
    #[error("SQL error: {reason}")]
    SqlxError {
        /// Context and message of the failure
        reason: String,
        /// The underlying sqlx error, if any
        #[source]
        source: Option<sqlx::Error>,
    },
}

impl BackendError {
    /// Check if this error reports a statement that does not fit the schema.
    pub fn is_schema_error(&self) -> bool {
        matches!(self, BackendError::UnknownColumn { .. })
    }

    /// Check if this error indicates a data integrity issue.
    pub fn is_integrity_error(&self) -> bool {
        matches!(
            self,
            BackendError::DuplicateKey { .. }
                | BackendError::TypeMismatch { .. }
                | BackendError::InvalidValue { .. }
                | BackendError::InvalidRow { .. }
        )
    }

    /// Check if this error is related to I/O operations.
    pub fn is_io_error(&self) -> bool {
        matches!(
            self,
            BackendError::FileIo { .. }
                | BackendError::SerializationFailed { .. }
                | BackendError::DeserializationFailed { .. }
        )
    }

    /// Check if this error came from the SQL driver.
    pub fn is_sql_error(&self) -> bool {
        #[cfg(feature = "sqlite")]
        if matches!(self, BackendError::SqlxError { .. }) {
            return true;
        }
        false
    }
}

impl From<BackendError> for crate::Error {
    fn from(err: BackendError) -> Self {
        crate::Error::Backend(err)
    }
}
