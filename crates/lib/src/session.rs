//! Login sessions.
//!
//! A session's identifier doubles as its bearer token: the text form of the
//! [`MeowId`] is what a client presents. The guest session (identifier 0,
//! text form `00000000-000-00000`) is the anonymous token and never expires.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::backend::{Filter, FromValue, Projection, Row, Table, Value};
use crate::constants::GUEST_ID;
use crate::store::{Access, Cached, Identity, Store, StoreError, row};
use crate::user::User;
use crate::{MeowId, Result};

/// A session owned by a user.
#[derive(Debug, Clone)]
pub struct Session {
    store: Store,
    id: MeowId,
    owner_id: Cached<MeowId>,
    creation_time: Cached<DateTime<Utc>>,
    expiration_time: Cached<Option<DateTime<Utc>>>,
}

impl Session {
    /// Open a session for `owner`.
    ///
    /// With `lifetime` the session expires that long from now; without one it
    /// never expires.
    pub fn create(store: &Store, owner: &User, lifetime: Option<Duration>) -> Result<Self> {
        let id = store.generate_id()?;
        let creation_time = store.now();
        let expiration_time = lifetime.map(|l| store.expires_at(l)).transpose()?;

        let mut writer = store.writer();
        writer.insert(
            Table::Sessions,
            row([
                ("id", Value::from(id)),
                ("owner_id", Value::from(owner.id())),
                ("creation_time", Value::from(creation_time)),
                ("expiration_time", Value::from(expiration_time)),
            ]),
        )?;
        writer.commit()?;
        info!(%id, owner = %owner.id(), "Created session");

        Ok(Self {
            store: store.clone(),
            id,
            owner_id: owner.id().into(),
            creation_time: creation_time.into(),
            expiration_time: expiration_time.into(),
        })
    }

    /// Open a session lasting
    /// [`default_session_lifetime_secs`](crate::StoreConfig::default_session_lifetime_secs).
    pub fn create_default(store: &Store, owner: &User) -> Result<Self> {
        Self::create(store, owner, Some(store.config().default_session_lifetime()))
    }

    fn from_row(store: &Store, row: &Row) -> Result<Self> {
        let field = |name: &str| row.get(name).unwrap_or(&Value::Null);
        Ok(Self {
            store: store.clone(),
            id: MeowId::from_value(field("id"))?,
            owner_id: MeowId::from_value(field("owner_id"))?.into(),
            creation_time: DateTime::<Utc>::from_value(field("creation_time"))?.into(),
            expiration_time: Option::<DateTime<Utc>>::from_value(field("expiration_time"))?
                .into(),
        })
    }

    pub fn get(store: &Store, id: MeowId) -> Result<Self> {
        let row = store
            .reader()
            .fetch_row(Table::Sessions, Projection::All, id)?;
        Self::from_row(store, &row)
    }

    pub fn get_all(store: &Store) -> Result<Vec<Self>> {
        let rows = store
            .reader()
            .fetch_rows(Table::Sessions, Projection::All, Filter::All)?;
        rows.iter().map(|row| Self::from_row(store, row)).collect()
    }

    /// Sessions belonging to `owner_id`.
    pub fn get_owned_by(store: &Store, owner_id: MeowId) -> Result<Vec<Self>> {
        let rows = store.reader().fetch_rows(
            Table::Sessions,
            Projection::All,
            Filter::Eq("owner_id", Value::from(owner_id)),
        )?;
        rows.iter().map(|row| Self::from_row(store, row)).collect()
    }

    /// The anonymous guest session.
    pub fn guest(store: &Store) -> Result<Self> {
        Self::get(store, GUEST_ID)
    }

    pub fn id(&self) -> MeowId {
        self.id
    }

    pub fn owner_id(&mut self) -> Result<MeowId> {
        let (store, id) = (&self.store, self.id);
        self.owner_id
            .get_or_try_load(|| store.reader().fetch_field(Table::Sessions, id, "owner_id"))
            .copied()
    }

    /// The owning user, freshly fetched.
    pub fn owner(&mut self) -> Result<User> {
        let owner_id = self.owner_id()?;
        User::get(&self.store, owner_id)
    }

    pub fn creation_time(&mut self) -> Result<DateTime<Utc>> {
        let (store, id) = (&self.store, self.id);
        self.creation_time
            .get_or_try_load(|| store.reader().fetch_field(Table::Sessions, id, "creation_time"))
            .copied()
    }

    /// When the session stops being valid; `None` if never.
    pub fn expiration_time(&mut self) -> Result<Option<DateTime<Utc>>> {
        let (store, id) = (&self.store, self.id);
        self.expiration_time
            .get_or_try_load(|| {
                store
                    .reader()
                    .fetch_field(Table::Sessions, id, "expiration_time")
            })
            .copied()
    }

    pub fn set_expiration_time(&mut self, expiration_time: Option<DateTime<Utc>>) -> Result<()> {
        if Identity::of(self.id).is_guest() {
            return Err(StoreError::PermissionDenied {
                operation: "changing the expiration of the guest session",
            }
            .into());
        }

        let mut writer = self.store.writer();
        writer.update_field(
            Table::Sessions,
            self.id,
            "expiration_time",
            Value::from(expiration_time),
        )?;
        writer.commit()?;

        self.expiration_time.invalidate();
        Ok(())
    }

    /// Whether the expiration time has passed on the store clock.
    ///
    /// Expired sessions are not removed; callers decide what to do with them.
    pub fn is_expired(&mut self) -> Result<bool> {
        let now = self.store.now();
        Ok(self.expiration_time()?.is_some_and(|at| at <= now))
    }

    pub fn delete(self) -> Result<()> {
        if Identity::of(self.id).is_guest() {
            return Err(StoreError::PermissionDenied {
                operation: "deletion of the guest session",
            }
            .into());
        }

        let mut writer = self.store.writer();
        if writer.delete(Table::Sessions, Filter::Id(self.id))? == 0 {
            return Err(StoreError::NotFound {
                kind: "session",
                id: self.id,
            }
            .into());
        }
        writer.commit()?;
        info!(id = %self.id, "Deleted session");
        Ok(())
    }
}
