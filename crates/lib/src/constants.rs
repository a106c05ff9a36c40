//! Constants used throughout the purrcafe library.
//!
//! This module provides central definitions for field widths, quotas, default
//! lifetimes and the reserved identifiers of the built-in accounts.

use crate::MeowId;

/// Maximum user name length, counted in characters.
pub const NAME_MAX_LENGTH: usize = 32;

/// Exact width of a stored password hash (hex-encoded SHA-512).
pub const PASSWORD_HASH_LENGTH: usize = 128;

/// Exact width of a stored file data hash.
pub const DATA_HASH_LENGTH: usize = 32;

/// Largest payload the guest user may upload (20 MiB).
pub const GUEST_MAX_FILE_SIZE: usize = 20 * 1024 * 1024;

/// Largest payload a regular user may upload (30 MiB).
pub const MAX_FILE_SIZE: usize = 30 * 1024 * 1024;

const DAY_SECS: u64 = 24 * 60 * 60;

/// Lifetime of a session issued by a password login.
pub const LOGIN_SESSION_LIFETIME_SECS: u64 = 7 * DAY_SECS;

/// Lifetime of a session created without an explicit one.
pub const DEFAULT_SESSION_LIFETIME_SECS: u64 = 30 * DAY_SECS;

/// Lifetime of an uploaded file created without an explicit one.
pub const DEFAULT_FILE_LIFETIME_SECS: u64 = 7 * DAY_SECS;

/// Reserved identifier of the guest user and the guest session.
pub const GUEST_ID: MeowId = MeowId::from_int(0);

/// Reserved identifier of the administrator account.
pub const ADMIN_ID: MeowId = MeowId::from_int(1);

/// Name the guest user is seeded with.
pub const GUEST_NAME: &str = "guest";

/// Name the administrator account is seeded with.
pub const ADMIN_NAME: &str = "admin";

/// MIME type assumed for uploads that do not name one.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";
