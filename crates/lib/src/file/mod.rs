//! Uploaded files.
//!
//! A [`File`] holds an opaque payload together with its hash, MIME type and
//! lifecycle fields. Two counters track how often the payload
//! (`access_count`) and the metadata (`meta_access_count`) were requested.
//! When `max_access_count` is set, the download that brings `access_count`
//! up to it is served and the file is deleted right after.
//!
//! ```
//! use purrcafe::{File, FileUpload, Store, User, backend::database::InMemory};
//!
//! let store = Store::open(Box::new(InMemory::new())).unwrap();
//! let guest = User::guest(&store).unwrap();
//!
//! let mut file = File::create(&store, &guest, FileUpload::hashed(b"meow".to_vec()).with_max_access_count(1)).unwrap();
//! assert_eq!(file.read().unwrap().data, b"meow");
//! assert!(File::get(&store, file.id()).unwrap_err().is_not_found());
//! ```

pub mod errors;
pub mod types;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::backend::{Filter, FromValue, Projection, Row, Table, Value};
use crate::store::{Access, Cached, Identity, Store, StoreError, row};
use crate::user::User;
use crate::{MeowId, Result};

pub use errors::FileError;
pub use types::{FileContent, FileMetadata, FileUpload, Lifetime};

/// An uploaded file.
///
/// Every column except the payload is cached lazily; the payload is only
/// reachable through [`File::read`], which counts as a download.
#[derive(Debug, Clone)]
pub struct File {
    store: Store,
    id: MeowId,
    uploader_id: Cached<MeowId>,
    uploader_hidden: Cached<bool>,
    upload_time: Cached<DateTime<Utc>>,
    expiration_time: Cached<Option<DateTime<Utc>>>,
    filename: Cached<Option<String>>,
    size: Cached<u64>,
    data_hash: Cached<String>,
    mime_type: Cached<String>,
    max_access_count: Cached<Option<u64>>,
    access_count: Cached<u64>,
    meta_access_count: Cached<u64>,
}

fn validate_data_hash(store: &Store, hash: &str) -> Result<()> {
    let expected = store.config().data_hash_length;
    let actual = hash.chars().count();
    if actual != expected {
        return Err(FileError::DataHashLength { expected, actual }.into());
    }
    Ok(())
}

/// Enforce the upload quota of `uploader`. The admin has none.
fn validate_size(store: &Store, uploader: Identity, size: usize) -> Result<()> {
    let max = match uploader {
        Identity::Admin => return Ok(()),
        Identity::Guest => store.config().guest_max_file_size,
        Identity::Regular(_) => store.config().max_file_size,
    };
    if size > max {
        return Err(FileError::SizeLimitExceeded { max, actual: size }.into());
    }
    Ok(())
}

fn field<'r>(row: &'r Row, name: &str) -> &'r Value {
    row.get(name).unwrap_or(&Value::Null)
}

impl File {
    /// Store an upload on behalf of `uploader`.
    pub fn create(store: &Store, uploader: &User, upload: FileUpload) -> Result<Self> {
        validate_data_hash(store, &upload.data_hash)?;
        validate_size(store, uploader.identity(), upload.data.len())?;

        let id = store.generate_id()?;
        let upload_time = store.now();
        let expiration_time = match upload.lifetime {
            Lifetime::Default => Some(store.expires_at(store.config().default_file_lifetime())?),
            Lifetime::Never => None,
            Lifetime::After(lifetime) => Some(store.expires_at(lifetime)?),
        };
        let size = upload.data.len();

        let mut writer = store.writer();
        writer.insert(
            Table::Files,
            row([
                ("id", Value::from(id)),
                ("uploader_id", Value::from(uploader.id())),
                ("uploader_hidden", Value::from(upload.uploader_hidden)),
                ("upload_time", Value::from(upload_time)),
                ("expiration_time", Value::from(expiration_time)),
                ("filename", Value::from(upload.filename.clone())),
                ("data", Value::from(upload.data)),
                ("size", Value::from(size as u64)),
                ("data_hash", Value::from(upload.data_hash.as_str())),
                ("mime_type", Value::from(upload.mime_type.as_str())),
                ("max_access_count", Value::from(upload.max_access_count)),
                ("access_count", Value::from(0u64)),
                ("meta_access_count", Value::from(0u64)),
            ]),
        )?;
        writer.commit()?;
        info!(%id, uploader = %uploader.id(), size, "Created file");

        Ok(Self {
            store: store.clone(),
            id,
            uploader_id: uploader.id().into(),
            uploader_hidden: upload.uploader_hidden.into(),
            upload_time: upload_time.into(),
            expiration_time: expiration_time.into(),
            filename: upload.filename.into(),
            size: (size as u64).into(),
            data_hash: upload.data_hash.into(),
            mime_type: upload.mime_type.into(),
            max_access_count: upload.max_access_count.into(),
            access_count: 0.into(),
            meta_access_count: 0.into(),
        })
    }

    fn from_row(store: &Store, row: &Row) -> Result<Self> {
        Ok(Self {
            store: store.clone(),
            id: MeowId::from_value(field(row, "id"))?,
            uploader_id: MeowId::from_value(field(row, "uploader_id"))?.into(),
            uploader_hidden: bool::from_value(field(row, "uploader_hidden"))?.into(),
            upload_time: DateTime::<Utc>::from_value(field(row, "upload_time"))?.into(),
            expiration_time: Option::<DateTime<Utc>>::from_value(field(row, "expiration_time"))?
                .into(),
            filename: Option::<String>::from_value(field(row, "filename"))?.into(),
            size: u64::from_value(field(row, "size"))?.into(),
            data_hash: String::from_value(field(row, "data_hash"))?.into(),
            mime_type: String::from_value(field(row, "mime_type"))?.into(),
            max_access_count: Option::<u64>::from_value(field(row, "max_access_count"))?.into(),
            access_count: u64::from_value(field(row, "access_count"))?.into(),
            meta_access_count: u64::from_value(field(row, "meta_access_count"))?.into(),
        })
    }

    /// Fetch a file with every field but the payload loaded.
    pub fn get(store: &Store, id: MeowId) -> Result<Self> {
        let row = store
            .reader()
            .fetch_row(Table::Files, Projection::AllExcept("data"), id)?;
        Self::from_row(store, &row)
    }

    pub fn get_all(store: &Store) -> Result<Vec<Self>> {
        let rows = store.reader().fetch_rows(
            Table::Files,
            Projection::AllExcept("data"),
            Filter::All,
        )?;
        rows.iter().map(|row| Self::from_row(store, row)).collect()
    }

    /// Files uploaded by `uploader_id`.
    pub fn get_uploaded_by(store: &Store, uploader_id: MeowId) -> Result<Vec<Self>> {
        let rows = store.reader().fetch_rows(
            Table::Files,
            Projection::AllExcept("data"),
            Filter::Eq("uploader_id", Value::from(uploader_id)),
        )?;
        rows.iter().map(|row| Self::from_row(store, row)).collect()
    }

    pub fn id(&self) -> MeowId {
        self.id
    }

    pub fn uploader_id(&mut self) -> Result<MeowId> {
        let (store, id) = (&self.store, self.id);
        self.uploader_id
            .get_or_try_load(|| store.reader().fetch_field(Table::Files, id, "uploader_id"))
            .copied()
    }

    /// The uploading user, freshly fetched.
    pub fn uploader(&mut self) -> Result<User> {
        let uploader_id = self.uploader_id()?;
        User::get(&self.store, uploader_id)
    }

    pub fn uploader_hidden(&mut self) -> Result<bool> {
        let (store, id) = (&self.store, self.id);
        self.uploader_hidden
            .get_or_try_load(|| store.reader().fetch_field(Table::Files, id, "uploader_hidden"))
            .copied()
    }

    pub fn upload_time(&mut self) -> Result<DateTime<Utc>> {
        let (store, id) = (&self.store, self.id);
        self.upload_time
            .get_or_try_load(|| store.reader().fetch_field(Table::Files, id, "upload_time"))
            .copied()
    }

    pub fn expiration_time(&mut self) -> Result<Option<DateTime<Utc>>> {
        let (store, id) = (&self.store, self.id);
        self.expiration_time
            .get_or_try_load(|| store.reader().fetch_field(Table::Files, id, "expiration_time"))
            .copied()
    }

    pub fn filename(&mut self) -> Result<Option<&str>> {
        let (store, id) = (&self.store, self.id);
        self.filename
            .get_or_try_load(|| store.reader().fetch_field(Table::Files, id, "filename"))
            .map(Option::as_deref)
    }

    /// Payload length in bytes.
    pub fn size(&mut self) -> Result<u64> {
        let (store, id) = (&self.store, self.id);
        self.size
            .get_or_try_load(|| store.reader().fetch_field(Table::Files, id, "size"))
            .copied()
    }

    pub fn data_hash(&mut self) -> Result<&str> {
        let (store, id) = (&self.store, self.id);
        self.data_hash
            .get_or_try_load(|| store.reader().fetch_field(Table::Files, id, "data_hash"))
            .map(String::as_str)
    }

    pub fn mime_type(&mut self) -> Result<&str> {
        let (store, id) = (&self.store, self.id);
        self.mime_type
            .get_or_try_load(|| store.reader().fetch_field(Table::Files, id, "mime_type"))
            .map(String::as_str)
    }

    pub fn max_access_count(&mut self) -> Result<Option<u64>> {
        let (store, id) = (&self.store, self.id);
        self.max_access_count
            .get_or_try_load(|| store.reader().fetch_field(Table::Files, id, "max_access_count"))
            .copied()
    }

    pub fn access_count(&mut self) -> Result<u64> {
        let (store, id) = (&self.store, self.id);
        self.access_count
            .get_or_try_load(|| store.reader().fetch_field(Table::Files, id, "access_count"))
            .copied()
    }

    pub fn meta_access_count(&mut self) -> Result<u64> {
        let (store, id) = (&self.store, self.id);
        self.meta_access_count
            .get_or_try_load(|| store.reader().fetch_field(Table::Files, id, "meta_access_count"))
            .copied()
    }

    /// Whether the expiration time has passed on the store clock.
    pub fn is_expired(&mut self) -> Result<bool> {
        let now = self.store.now();
        Ok(self.expiration_time()?.is_some_and(|at| at <= now))
    }

    fn write_field(&self, column: &'static str, value: Value) -> Result<()> {
        let mut writer = self.store.writer();
        writer.update_field(Table::Files, self.id, column, value)?;
        writer.commit()
    }

    pub fn set_uploader_hidden(&mut self, hidden: bool) -> Result<()> {
        self.write_field("uploader_hidden", Value::from(hidden))?;
        self.uploader_hidden.invalidate();
        Ok(())
    }

    pub fn set_expiration_time(&mut self, expiration_time: Option<DateTime<Utc>>) -> Result<()> {
        self.write_field("expiration_time", Value::from(expiration_time))?;
        self.expiration_time.invalidate();
        Ok(())
    }

    pub fn set_filename(&mut self, filename: Option<&str>) -> Result<()> {
        self.write_field("filename", Value::from(filename))?;
        self.filename.invalidate();
        Ok(())
    }

    /// Replace the payload. The uploader's quota applies again.
    ///
    /// The stored hash is left alone; update it with [`File::set_data_hash`].
    pub fn set_data(&mut self, data: Vec<u8>) -> Result<()> {
        let uploader = Identity::of(self.uploader_id()?);
        validate_size(&self.store, uploader, data.len())?;

        let size = data.len() as u64;
        let mut writer = self.store.writer();
        writer.update_field(Table::Files, self.id, "data", Value::from(data))?;
        writer.update_field(Table::Files, self.id, "size", Value::from(size))?;
        writer.commit()?;

        self.size.invalidate();
        Ok(())
    }

    /// Store a bumped download or metadata counter.
    ///
    /// The row may have been deleted since it was read; the caller already
    /// holds what it read, so that is logged and not an error.
    fn store_counter(&self, column: &'static str, count: u64) -> Result<()> {
        let mut writer = self.store.writer();
        match writer.update_field(Table::Files, self.id, column, Value::from(count)) {
            Ok(()) => writer.commit(),
            Err(err) if err.is_not_found() => {
                writer.commit()?;
                warn!(id = %self.id, column, "File was deleted before its counter was stored");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    pub fn set_data_hash(&mut self, data_hash: &str) -> Result<()> {
        validate_data_hash(&self.store, data_hash)?;
        self.write_field("data_hash", Value::from(data_hash))?;
        self.data_hash.invalidate();
        Ok(())
    }

    pub fn set_mime_type(&mut self, mime_type: &str) -> Result<()> {
        self.write_field("mime_type", Value::from(mime_type))?;
        self.mime_type.invalidate();
        Ok(())
    }

    pub fn set_max_access_count(&mut self, max_access_count: Option<u64>) -> Result<()> {
        self.write_field("max_access_count", Value::from(max_access_count))?;
        self.max_access_count.invalidate();
        Ok(())
    }

    /// Download the payload.
    ///
    /// The row is read under the shared lock and the incremented counter is
    /// written under the exclusive one, so concurrent downloads of the same
    /// file may lose increments. When the new count reaches
    /// `max_access_count` the file is deleted after its content has been
    /// captured; a `max_access_count` of zero therefore allows one download.
    pub fn read(&mut self) -> Result<FileContent> {
        let row = self
            .store
            .reader()
            .fetch_row(Table::Files, Projection::All, self.id)?;

        let access_count = u64::from_value(field(&row, "access_count"))?.saturating_add(1);
        let max_access_count = Option::<u64>::from_value(field(&row, "max_access_count"))?;
        let exhausted = max_access_count.is_some_and(|max| access_count >= max);

        let content = FileContent {
            data: Vec::<u8>::from_value(field(&row, "data"))?,
            data_hash: String::from_value(field(&row, "data_hash"))?,
            mime_type: String::from_value(field(&row, "mime_type"))?,
            filename: Option::<String>::from_value(field(&row, "filename"))?,
            remaining_downloads: max_access_count.map(|max| max.saturating_sub(access_count)),
        };

        if exhausted {
            // A concurrent download may have removed the row already.
            let mut writer = self.store.writer();
            writer.delete(Table::Files, Filter::Id(self.id))?;
            writer.commit()?;
            warn!(id = %self.id, access_count, "Deleted file after its last allowed download");
        } else {
            self.store_counter("access_count", access_count)?;
            debug!(id = %self.id, access_count, "Served file");
        }

        self.access_count.invalidate();
        Ok(content)
    }

    /// Describe the file and count the request in `meta_access_count`.
    ///
    /// Metadata requests never count against `max_access_count`.
    pub fn meta(&mut self) -> Result<FileMetadata> {
        let row = self
            .store
            .reader()
            .fetch_row(Table::Files, Projection::AllExcept("data"), self.id)?;

        let meta_access_count =
            u64::from_value(field(&row, "meta_access_count"))?.saturating_add(1);
        let uploader_hidden = bool::from_value(field(&row, "uploader_hidden"))?;
        let uploader_id = MeowId::from_value(field(&row, "uploader_id"))?;

        let metadata = FileMetadata {
            id: self.id,
            uploader_id: (!uploader_hidden).then_some(uploader_id),
            upload_time: DateTime::<Utc>::from_value(field(&row, "upload_time"))?,
            expiration_time: Option::<DateTime<Utc>>::from_value(field(&row, "expiration_time"))?,
            filename: Option::<String>::from_value(field(&row, "filename"))?,
            mime_type: String::from_value(field(&row, "mime_type"))?,
            size: u64::from_value(field(&row, "size"))?,
            max_access_count: Option::<u64>::from_value(field(&row, "max_access_count"))?,
            access_count: u64::from_value(field(&row, "access_count"))?,
            meta_access_count,
        };

        self.store_counter("meta_access_count", meta_access_count)?;

        self.meta_access_count.invalidate();
        Ok(metadata)
    }

    /// Delete the file. Guest uploads cannot be deleted this way.
    pub fn delete(mut self) -> Result<()> {
        if Identity::of(self.uploader_id()?).is_guest() {
            return Err(StoreError::PermissionDenied {
                operation: "deletion of files uploaded by guest",
            }
            .into());
        }
        self.remove()
    }

    /// Delete the file on behalf of `actor`.
    ///
    /// The admin may delete any file. Anyone else may only delete their own
    /// uploads, and nobody but the admin may delete guest uploads.
    pub fn delete_by(mut self, actor: &User) -> Result<()> {
        if !actor.identity().is_admin() {
            let uploader_id = self.uploader_id()?;
            if Identity::of(uploader_id).is_guest() {
                return Err(StoreError::PermissionDenied {
                    operation: "deletion of files uploaded by guest",
                }
                .into());
            }
            if uploader_id != actor.id() {
                return Err(StoreError::PermissionDenied {
                    operation: "deletion of another user's file",
                }
                .into());
            }
        }
        self.remove()
    }

    fn remove(self) -> Result<()> {
        let mut writer = self.store.writer();
        if writer.delete(Table::Files, Filter::Id(self.id))? == 0 {
            return Err(StoreError::NotFound {
                kind: "file",
                id: self.id,
            }
            .into());
        }
        writer.commit()?;
        info!(id = %self.id, "Deleted file");
        Ok(())
    }
}
