//! Store configuration.
//!
//! [`StoreConfig`] carries the quotas, hash widths and default lifetimes the
//! entities validate against. Every field has a default, so a JSON file only
//! needs to name the values it overrides:
//!
//! ```
//! use purrcafe::StoreConfig;
//!
//! let config: StoreConfig = serde_json::from_str(r#"{ "max_file_size": 1024 }"#).unwrap();
//! assert_eq!(config.max_file_size, 1024);
//! assert_eq!(config.guest_max_file_size, purrcafe::constants::GUEST_MAX_FILE_SIZE);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::constants::{
    DATA_HASH_LENGTH, DEFAULT_FILE_LIFETIME_SECS, DEFAULT_SESSION_LIFETIME_SECS,
    GUEST_MAX_FILE_SIZE, LOGIN_SESSION_LIFETIME_SECS, MAX_FILE_SIZE,
};

/// Runtime-tunable limits of a [`Store`](crate::Store).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Upload limit in bytes for the guest user.
    pub guest_max_file_size: usize,
    /// Upload limit in bytes for regular users.
    pub max_file_size: usize,
    /// Required width of file data hashes.
    pub data_hash_length: usize,
    /// Lifetime of sessions issued by `User::authorize`.
    pub login_session_lifetime_secs: u64,
    /// Lifetime of sessions created without an explicit one.
    pub default_session_lifetime_secs: u64,
    /// Lifetime of files uploaded without an explicit one.
    pub default_file_lifetime_secs: u64,
    /// Password hash for the administrator account. The account is only
    /// seeded when this is set.
    pub admin_password_hash: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            guest_max_file_size: GUEST_MAX_FILE_SIZE,
            max_file_size: MAX_FILE_SIZE,
            data_hash_length: DATA_HASH_LENGTH,
            login_session_lifetime_secs: LOGIN_SESSION_LIFETIME_SECS,
            default_session_lifetime_secs: DEFAULT_SESSION_LIFETIME_SECS,
            default_file_lifetime_secs: DEFAULT_FILE_LIFETIME_SECS,
            admin_password_hash: None,
        }
    }
}

impl StoreConfig {
    /// Load a configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Builder-style setter for the administrator password hash.
    pub fn with_admin_password_hash(mut self, hash: impl Into<String>) -> Self {
        self.admin_password_hash = Some(hash.into());
        self
    }

    pub(crate) fn login_session_lifetime(&self) -> Duration {
        Duration::from_secs(self.login_session_lifetime_secs)
    }

    pub(crate) fn default_session_lifetime(&self) -> Duration {
        Duration::from_secs(self.default_session_lifetime_secs)
    }

    pub(crate) fn default_file_lifetime(&self) -> Duration {
        Duration::from_secs(self.default_file_lifetime_secs)
    }
}
