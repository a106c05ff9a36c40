//! User accounts.
//!
//! A [`User`] is a disposable view over one row of the `users` table. Fields
//! load lazily on first access and are cached per view; setters write
//! through and drop the cached value instead of updating it.
//!
//! The guest user (identifier 0) is seeded by the store and can be neither
//! modified nor deleted, and neither can the administrator account.

pub mod errors;

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::backend::{Filter, FromValue, Projection, Row, Table, Value};
use crate::constants::{GUEST_ID, NAME_MAX_LENGTH, PASSWORD_HASH_LENGTH};
use crate::file::File;
use crate::session::Session;
use crate::store::{Access, Cached, Identity, Store, StoreError, row};
use crate::{MeowId, Result};

pub use errors::UserError;

/// A user account.
#[derive(Debug, Clone)]
pub struct User {
    store: Store,
    id: MeowId,
    name: Cached<String>,
    email: Cached<String>,
    password_hash: Cached<String>,
    creation_time: Cached<DateTime<Utc>>,
}

fn validate_name(name: &str) -> Result<()> {
    let actual = name.chars().count();
    if actual > NAME_MAX_LENGTH {
        return Err(UserError::NameTooLong {
            max: NAME_MAX_LENGTH,
            actual,
        }
        .into());
    }
    Ok(())
}

fn validate_password_hash(hash: &str) -> Result<()> {
    let actual = hash.chars().count();
    if actual != PASSWORD_HASH_LENGTH {
        return Err(UserError::PasswordHashLength {
            expected: PASSWORD_HASH_LENGTH,
            actual,
        }
        .into());
    }
    Ok(())
}

/// Fail with `NameAlreadyExists` if another user holds `name`.
fn ensure_name_free(access: &mut impl Access, name: &str, except: Option<MeowId>) -> Result<()> {
    let holders = access.fetch_rows(
        Table::Users,
        Projection::Columns(vec!["id"]),
        Filter::Eq("name", Value::from(name)),
    )?;
    for holder in holders {
        let id = MeowId::from_value(holder.get("id").unwrap_or(&Value::Null))?;
        if Some(id) != except {
            return Err(UserError::NameAlreadyExists {
                name: name.to_string(),
            }
            .into());
        }
    }
    Ok(())
}

impl User {
    /// Create a new account.
    ///
    /// `name` may have at most 32 characters and must not be taken;
    /// `password_hash` must be exactly 128 characters. The store never hashes
    /// anything itself.
    pub fn create(store: &Store, name: &str, email: &str, password_hash: &str) -> Result<Self> {
        validate_name(name)?;
        validate_password_hash(password_hash)?;

        let id = store.generate_id()?;
        let creation_time = store.now();

        let mut writer = store.writer();
        ensure_name_free(&mut writer, name, None)?;
        writer.insert(
            Table::Users,
            row([
                ("id", Value::from(id)),
                ("name", Value::from(name)),
                ("email", Value::from(email)),
                ("password_hash", Value::from(password_hash)),
                ("creation_time", Value::from(creation_time)),
            ]),
        )?;
        writer.commit()?;
        info!(%id, name, "Created user");

        Ok(Self {
            store: store.clone(),
            id,
            name: name.to_string().into(),
            email: email.to_string().into(),
            password_hash: password_hash.to_string().into(),
            creation_time: creation_time.into(),
        })
    }

    fn from_row(store: &Store, row: &Row) -> Result<Self> {
        let field = |name: &str| row.get(name).unwrap_or(&Value::Null);
        Ok(Self {
            store: store.clone(),
            id: MeowId::from_value(field("id"))?,
            name: String::from_value(field("name"))?.into(),
            email: String::from_value(field("email"))?.into(),
            password_hash: String::from_value(field("password_hash"))?.into(),
            creation_time: DateTime::<Utc>::from_value(field("creation_time"))?.into(),
        })
    }

    /// Fetch a user with every field loaded.
    pub fn get(store: &Store, id: MeowId) -> Result<Self> {
        let row = store.reader().fetch_row(Table::Users, Projection::All, id)?;
        Self::from_row(store, &row)
    }

    /// Snapshot of every user, the reserved accounts included.
    pub fn get_all(store: &Store) -> Result<Vec<Self>> {
        let rows = store
            .reader()
            .fetch_rows(Table::Users, Projection::All, Filter::All)?;
        rows.iter().map(|row| Self::from_row(store, row)).collect()
    }

    /// Look a user up by name.
    pub fn find(store: &Store, name: &str) -> Result<Self> {
        let rows = store.reader().fetch_rows(
            Table::Users,
            Projection::All,
            Filter::Eq("name", Value::from(name)),
        )?;
        match rows.first() {
            Some(row) => Self::from_row(store, row),
            None => Err(UserError::NameNotFound {
                name: name.to_string(),
            }
            .into()),
        }
    }

    /// The guest pseudo-user.
    pub fn guest(store: &Store) -> Result<Self> {
        Self::get(store, GUEST_ID)
    }

    /// Find a user by name and open a login session for them.
    pub fn login(store: &Store, name: &str, password_hash: &str) -> Result<Session> {
        Self::find(store, name)?.authorize(password_hash, None)
    }

    pub fn id(&self) -> MeowId {
        self.id
    }

    pub fn identity(&self) -> Identity {
        Identity::of(self.id)
    }

    pub fn name(&mut self) -> Result<&str> {
        let (store, id) = (&self.store, self.id);
        self.name
            .get_or_try_load(|| store.reader().fetch_field(Table::Users, id, "name"))
            .map(String::as_str)
    }

    pub fn email(&mut self) -> Result<&str> {
        let (store, id) = (&self.store, self.id);
        self.email
            .get_or_try_load(|| store.reader().fetch_field(Table::Users, id, "email"))
            .map(String::as_str)
    }

    pub fn password_hash(&mut self) -> Result<&str> {
        let (store, id) = (&self.store, self.id);
        self.password_hash
            .get_or_try_load(|| store.reader().fetch_field(Table::Users, id, "password_hash"))
            .map(String::as_str)
    }

    pub fn creation_time(&mut self) -> Result<DateTime<Utc>> {
        let (store, id) = (&self.store, self.id);
        self.creation_time
            .get_or_try_load(|| store.reader().fetch_field(Table::Users, id, "creation_time"))
            .copied()
    }

    fn ensure_mutable(&self, operation: &'static str) -> Result<()> {
        if self.identity().is_reserved() {
            return Err(StoreError::PermissionDenied { operation }.into());
        }
        Ok(())
    }

    /// Rename the user. Names stay unique.
    pub fn set_name(&mut self, name: &str) -> Result<()> {
        self.ensure_mutable("renaming a reserved user")?;
        validate_name(name)?;

        let mut writer = self.store.writer();
        ensure_name_free(&mut writer, name, Some(self.id))?;
        writer.update_field(Table::Users, self.id, "name", Value::from(name))?;
        writer.commit()?;

        self.name.invalidate();
        Ok(())
    }

    pub fn set_email(&mut self, email: &str) -> Result<()> {
        self.ensure_mutable("changing the email of a reserved user")?;

        let mut writer = self.store.writer();
        writer.update_field(Table::Users, self.id, "email", Value::from(email))?;
        writer.commit()?;

        self.email.invalidate();
        Ok(())
    }

    pub fn set_password_hash(&mut self, password_hash: &str) -> Result<()> {
        self.ensure_mutable("changing the password of a reserved user")?;
        validate_password_hash(password_hash)?;

        let mut writer = self.store.writer();
        writer.update_field(
            Table::Users,
            self.id,
            "password_hash",
            Value::from(password_hash),
        )?;
        writer.commit()?;

        self.password_hash.invalidate();
        Ok(())
    }

    /// Sessions owned by this user.
    pub fn sessions(&self) -> Result<Vec<Session>> {
        Session::get_owned_by(&self.store, self.id)
    }

    /// Files uploaded by this user.
    pub fn files(&self) -> Result<Vec<File>> {
        File::get_uploaded_by(&self.store, self.id)
    }

    /// Check `password_hash` against the stored one and open a session.
    ///
    /// The stored hash is always re-read, so a password changed through
    /// another view takes effect immediately.
    ///
    /// Without an explicit `lifetime` the session lasts
    /// [`login_session_lifetime_secs`](crate::StoreConfig::login_session_lifetime_secs).
    /// The guest cannot log in.
    pub fn authorize(&mut self, password_hash: &str, lifetime: Option<Duration>) -> Result<Session> {
        if self.identity().is_guest() {
            return Err(StoreError::PermissionDenied {
                operation: "authorization as guest",
            }
            .into());
        }
        // Compare against the stored hash, not a value cached before a change.
        self.password_hash.invalidate();
        if self.password_hash()? != password_hash {
            return Err(UserError::CredentialMismatch.into());
        }
        let lifetime = lifetime.unwrap_or_else(|| self.store.config().login_session_lifetime());
        Session::create(&self.store, self, Some(lifetime))
    }

    /// Delete the user together with its sessions and files.
    ///
    /// Sessions go first, then files, then the user row; each step commits
    /// on its own. A failure part-way leaves the earlier steps applied.
    pub fn delete(self) -> Result<()> {
        self.ensure_mutable("deletion of a reserved user")?;

        for session in self.sessions()? {
            session.delete()?;
        }
        for file in self.files()? {
            file.delete()?;
        }

        let mut writer = self.store.writer();
        if writer.delete(Table::Users, Filter::Id(self.id))? == 0 {
            return Err(StoreError::NotFound {
                kind: "user",
                id: self.id,
            }
            .into());
        }
        writer.commit()?;
        info!(id = %self.id, "Deleted user");
        Ok(())
    }
}
