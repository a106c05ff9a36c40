//!
//! Purrcafe: identifier generation and resource lifecycle for a small file-sharing service.
//! This library provides the storage core the service is built on.
//!
//! ## Core Concepts
//!
//! * **MeowIDs (`meowid::MeowId`)**: 64-bit, time-ordered identifiers packing a second-resolution timestamp, a per-second sequence counter and a random salt. Their text form `TTTTTTTT-SSS-SALTS` doubles as the session token.
//! * **Generator (`meowid::MeowIdGenerator`)**: The process-wide service minting identifiers, at most 4096 per second.
//! * **Backends (`backend::BackendImpl`)**: A pluggable persistent store executing parameterized statements over a fixed schema, with commit and rollback.
//! * **Store (`store::Store`)**: The shared handle every entity goes through. It owns the backend, the generator, the configuration and the one readers-writer lock that guards all storage access.
//! * **Entities (`user::User`, `session::Session`, `file::File`)**: Disposable views over single rows. Fields load lazily and are cached until the view itself writes them.
//! * **Expiring resources**: Sessions and files carry an optional expiration time, and files an optional download quota after which they delete themselves.

pub mod backend;
pub mod clock;
pub mod config;
pub mod constants;
pub mod file;
pub mod hash;
pub mod meowid;
pub mod session;
pub mod store;
pub mod user;

pub use clock::{Clock, ClockHold, FixedClock, SystemClock};
pub use config::StoreConfig;
pub use file::{File, FileContent, FileError, FileMetadata, FileUpload, Lifetime};
pub use meowid::{MeowId, MeowIdError, MeowIdGenerator};
pub use session::Session;
pub use store::{Access, Cached, Identity, Store, StoreError};
pub use user::{User, UserError};

/// Result type used throughout the purrcafe library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the purrcafe library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Identifier construction, parsing and generation errors
    #[error(transparent)]
    MeowId(meowid::MeowIdError),

    /// Structured storage errors from the backend module
    #[error(transparent)]
    Backend(backend::BackendError),

    /// Lookup and permission errors from the store
    #[error(transparent)]
    Store(store::StoreError),

    /// User validation and login errors
    #[error(transparent)]
    User(user::UserError),

    /// File upload validation errors
    #[error(transparent)]
    File(file::FileError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::MeowId(_) => "meowid",
            Error::Backend(_) => "backend",
            Error::Store(_) => "store",
            Error::User(_) => "user",
            Error::File(_) => "file",
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
        }
    }

    /// Check if this error is a value outside its representable range.
    pub fn is_range_error(&self) -> bool {
        match self {
            Error::MeowId(meowid_err) => meowid_err.is_range_error(),
            Error::Store(store_err) => store_err.is_range_error(),
            _ => false,
        }
    }

    /// Check if this error is a string exceeding its maximum length.
    pub fn is_length_error(&self) -> bool {
        match self {
            Error::User(user_err) => user_err.is_length_error(),
            _ => false,
        }
    }

    /// Check if this error is a hash of the wrong width.
    pub fn is_hash_length_error(&self) -> bool {
        match self {
            Error::User(user_err) => user_err.is_hash_length_error(),
            Error::File(file_err) => file_err.is_hash_length_error(),
            _ => false,
        }
    }

    /// Check if this error is an exceeded upload quota.
    pub fn is_size_limit_error(&self) -> bool {
        match self {
            Error::File(file_err) => file_err.is_size_limit_error(),
            _ => false,
        }
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_not_found(),
            Error::User(user_err) => user_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error indicates permission was denied.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_permission_denied(),
            _ => false,
        }
    }

    /// Check if this error is a failed password check.
    pub fn is_credential_mismatch(&self) -> bool {
        match self {
            Error::User(user_err) => user_err.is_credential_mismatch(),
            _ => false,
        }
    }

    /// Check if this error means the generator ran out of identifiers for the current second.
    pub fn is_exhausted(&self) -> bool {
        match self {
            Error::MeowId(meowid_err) => meowid_err.is_exhausted(),
            _ => false,
        }
    }

    /// Check if this error is a malformed textual identifier.
    pub fn is_parse_error(&self) -> bool {
        match self {
            Error::MeowId(meowid_err) => meowid_err.is_parse_error(),
            _ => false,
        }
    }

    /// Check if this error indicates a conflict (already exists).
    pub fn is_conflict(&self) -> bool {
        match self {
            Error::User(user_err) => user_err.is_conflict(),
            _ => false,
        }
    }

    /// Check if this error is database/backend-related.
    pub fn is_database_error(&self) -> bool {
        matches!(self, Error::Backend(_))
    }

    /// Check if this error indicates a data integrity issue.
    pub fn is_integrity_error(&self) -> bool {
        match self {
            Error::Backend(backend_err) => backend_err.is_integrity_error(),
            _ => false,
        }
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        match self {
            Error::Io(_) => true,
            Error::Backend(backend_err) => backend_err.is_io_error(),
            _ => false,
        }
    }
}
