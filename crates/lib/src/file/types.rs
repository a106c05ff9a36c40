//! Value types passed into and returned from [`File`](super::File).

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::MeowId;
use crate::constants::DEFAULT_MIME_TYPE;
use crate::hash::data_hash;

/// How long an uploaded file lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Lifetime {
    /// [`default_file_lifetime_secs`](crate::StoreConfig::default_file_lifetime_secs).
    #[default]
    Default,
    /// The file never expires.
    Never,
    /// The file expires this long after upload.
    After(Duration),
}

/// Everything needed to create a [`File`](super::File).
///
/// ```
/// use purrcafe::{FileUpload, Lifetime};
///
/// let upload = FileUpload::hashed(b"meow".to_vec())
///     .with_filename("cat.txt")
///     .with_mime_type("text/plain")
///     .with_max_access_count(1)
///     .with_lifetime(Lifetime::Never);
/// assert_eq!(upload.data_hash.len(), 32);
/// ```
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub data: Vec<u8>,
    pub data_hash: String,
    pub mime_type: String,
    pub filename: Option<String>,
    pub uploader_hidden: bool,
    pub max_access_count: Option<u64>,
    pub lifetime: Lifetime,
}

impl FileUpload {
    /// Upload `data` with a hash the client computed.
    pub fn new(data: Vec<u8>, data_hash: impl Into<String>) -> Self {
        Self {
            data,
            data_hash: data_hash.into(),
            mime_type: DEFAULT_MIME_TYPE.to_string(),
            filename: None,
            uploader_hidden: false,
            max_access_count: None,
            lifetime: Lifetime::Default,
        }
    }

    /// Upload `data` hashed with [`data_hash`](crate::hash::data_hash).
    pub fn hashed(data: Vec<u8>) -> Self {
        let hash = data_hash(&data);
        Self::new(data, hash)
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Hide the uploader from metadata readers.
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.uploader_hidden = hidden;
        self
    }

    /// Delete the file once it has been downloaded `count` times.
    pub fn with_max_access_count(mut self, count: u64) -> Self {
        self.max_access_count = Some(count);
        self
    }

    pub fn with_lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = lifetime;
        self
    }
}

/// A downloaded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    pub data: Vec<u8>,
    pub data_hash: String,
    pub mime_type: String,
    pub filename: Option<String>,
    /// Downloads left before the file deletes itself; `None` if unlimited.
    /// Zero means this download removed the file.
    pub remaining_downloads: Option<u64>,
}

/// Public description of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMetadata {
    pub id: MeowId,
    /// `None` when the uploader chose to stay hidden.
    pub uploader_id: Option<MeowId>,
    pub upload_time: DateTime<Utc>,
    pub expiration_time: Option<DateTime<Utc>>,
    pub filename: Option<String>,
    pub mime_type: String,
    pub size: u64,
    pub max_access_count: Option<u64>,
    pub access_count: u64,
    pub meta_access_count: u64,
}
