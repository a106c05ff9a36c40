//! Error types for store operations shared by every entity.

use thiserror::Error;

use crate::MeowId;

/// Errors raised by the store itself rather than by entity validation.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No row exists for the identifier.
    #[error("{kind} with ID {id} not found")]
    NotFound {
        /// Entity kind ("user", "session", "file")
        kind: &'static str,
        /// The identifier that has no row
        id: MeowId,
    },

    /// The operation is forbidden for the acting or targeted identity.
    #[error("permission denied: {operation}")]
    PermissionDenied {
        /// What was attempted
        operation: &'static str,
    },

    /// A lifetime does not fit the timestamp range.
    #[error("lifetime of {secs} seconds is out of range")]
    LifetimeOutOfRange { secs: u64 },

    /// A cached field had no value after loading it.
    #[error("cached field is not loaded")]
    CacheUnloaded,
}

impl StoreError {
    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// Check if this error indicates permission was denied.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, StoreError::PermissionDenied { .. })
    }

    /// Check if this error is a value outside its representable range.
    pub fn is_range_error(&self) -> bool {
        matches!(self, StoreError::LifetimeOutOfRange { .. })
    }

    /// The identifier a `NotFound` error refers to.
    pub fn id(&self) -> Option<MeowId> {
        match self {
            StoreError::NotFound { id, .. } => Some(*id),
            _ => None,
        }
    }
}

impl From<StoreError> for crate::Error {
    fn from(err: StoreError) -> Self {
        crate::Error::Store(err)
    }
}
