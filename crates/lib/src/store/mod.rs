//! The expiring-resource store.
//!
//! [`Store`] is the one object every entity goes through. It owns the backend,
//! the identifier generator, the configuration and a single process-wide
//! readers-writer lock that gates *all* storage access:
//!
//! * reads take the lock shared through [`Store::reader`]
//! * writes take it exclusively through [`Store::writer`] and commit before
//!   the guard is released
//!
//! Construct one `Store` at process start and clone the handle wherever it is
//! needed; clones share the lock, backend and generator.
//!
//! ```
//! use purrcafe::{Store, User, backend::database::InMemory, hash::password_hash};
//!
//! let store = Store::open(Box::new(InMemory::new())).unwrap();
//! let user = User::create(&store, "tom", "tom@example.com", &password_hash("meow")).unwrap();
//! assert_eq!(User::get(&store, user.id()).unwrap().id(), user.id());
//! ```

pub mod cache;
pub mod errors;
pub mod identity;

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use handle_trait::Handle;
use tracing::{debug, info, warn};

use crate::backend::{
    BackendImpl, Filter, FromValue, Outcome, Projection, Row, Statement, Table, Value,
};
use crate::constants::{ADMIN_ID, ADMIN_NAME, GUEST_ID, GUEST_NAME, PASSWORD_HASH_LENGTH};
use crate::user::UserError;
use crate::{Clock, MeowId, MeowIdGenerator, Result, StoreConfig};

pub use cache::Cached;
pub use errors::StoreError;
pub use identity::Identity;

/// Handle to the shared store.
#[derive(Clone, Debug, Handle)]
pub struct Store {
    inner: Arc<StoreInternal>,
}

struct StoreInternal {
    backend: Box<dyn BackendImpl>,
    lock: RwLock<()>,
    generator: Arc<MeowIdGenerator>,
    config: StoreConfig,
}

impl std::fmt::Debug for StoreInternal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreInternal")
            .field("generator", &self.generator)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Store {
    /// Open a store with the default configuration and a system-clock generator.
    ///
    /// Reserved rows (guest user, guest session) are seeded if the backend
    /// does not have them yet.
    pub fn open(backend: Box<dyn BackendImpl>) -> Result<Self> {
        Self::open_with(
            backend,
            StoreConfig::default(),
            Arc::new(MeowIdGenerator::default()),
        )
    }

    /// Open a store with an explicit configuration and generator.
    ///
    /// Tests inject a generator on a [`FixedClock`](crate::FixedClock) here.
    pub fn open_with(
        backend: Box<dyn BackendImpl>,
        config: StoreConfig,
        generator: Arc<MeowIdGenerator>,
    ) -> Result<Self> {
        let store = Self {
            inner: Arc::new(StoreInternal {
                backend,
                lock: RwLock::new(()),
                generator,
                config,
            }),
        };
        store.seed_reserved()?;
        Ok(store)
    }

    fn seed_reserved(&self) -> Result<()> {
        let now = self.now();
        let mut writer = self.writer();

        if !writer.exists(Table::Users, GUEST_ID)? {
            writer.insert(
                Table::Users,
                row([
                    ("id", Value::from(GUEST_ID)),
                    ("name", Value::from(GUEST_NAME)),
                    ("email", Value::from("")),
                    ("password_hash", Value::from("0".repeat(PASSWORD_HASH_LENGTH))),
                    ("creation_time", Value::from(now)),
                ]),
            )?;
            info!("Seeded guest user");
        }

        if !writer.exists(Table::Sessions, GUEST_ID)? {
            writer.insert(
                Table::Sessions,
                row([
                    ("id", Value::from(GUEST_ID)),
                    ("owner_id", Value::from(GUEST_ID)),
                    ("creation_time", Value::from(now)),
                    ("expiration_time", Value::Null),
                ]),
            )?;
            info!("Seeded guest session");
        }

        if let Some(hash) = &self.inner.config.admin_password_hash
            && !writer.exists(Table::Users, ADMIN_ID)?
        {
            if hash.chars().count() != PASSWORD_HASH_LENGTH {
                return Err(UserError::PasswordHashLength {
                    expected: PASSWORD_HASH_LENGTH,
                    actual: hash.chars().count(),
                }
                .into());
            }
            writer.insert(
                Table::Users,
                row([
                    ("id", Value::from(ADMIN_ID)),
                    ("name", Value::from(ADMIN_NAME)),
                    ("email", Value::from("")),
                    ("password_hash", Value::from(hash.as_str())),
                    ("creation_time", Value::from(now)),
                ]),
            )?;
            info!("Seeded admin user");
        }

        writer.commit()
    }

    /// Acquire the lock shared.
    pub fn reader(&self) -> ReadGuard<'_> {
        ReadGuard {
            backend: self.inner.backend.as_ref(),
            _lock: self
                .inner
                .lock
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// Acquire the lock exclusively.
    ///
    /// Writes made through the guard are rolled back unless
    /// [`WriteGuard::commit`] is called.
    pub fn writer(&self) -> WriteGuard<'_> {
        WriteGuard {
            backend: self.inner.backend.as_ref(),
            _lock: self
                .inner
                .lock
                .write()
                .unwrap_or_else(PoisonError::into_inner),
            dirty: false,
        }
    }

    /// The backend this store runs on, e.g. to downcast and save an `InMemory`.
    pub fn backend(&self) -> &dyn BackendImpl {
        self.inner.backend.as_ref()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    pub fn generator(&self) -> &Arc<MeowIdGenerator> {
        &self.inner.generator
    }

    /// The clock entity timestamps are taken from.
    pub fn clock(&self) -> &dyn Clock {
        self.inner.generator.clock().as_ref()
    }

    /// Current time, truncated to the second.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock().now_utc()
    }

    /// `now()` pushed forward by `lifetime`.
    pub(crate) fn expires_at(&self, lifetime: Duration) -> Result<DateTime<Utc>> {
        let out_of_range = || StoreError::LifetimeOutOfRange {
            secs: lifetime.as_secs(),
        };
        let delta = TimeDelta::from_std(lifetime).map_err(|_| out_of_range())?;
        Ok(self
            .now()
            .checked_add_signed(delta)
            .ok_or_else(out_of_range)?)
    }

    /// Mint a fresh identifier.
    pub fn generate_id(&self) -> Result<MeowId> {
        Ok(self.inner.generator.generate()?)
    }

    /// Resolve an identifier against the reserved accounts.
    pub fn identity(&self, id: MeowId) -> Identity {
        Identity::of(id)
    }
}

/// Build a row from static column names.
pub(crate) fn row<const N: usize>(columns: [(&'static str, Value); N]) -> Row {
    columns
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

/// Entity kind of a table, for error messages.
pub(crate) fn kind(table: Table) -> &'static str {
    match table {
        Table::Users => "user",
        Table::Sessions => "session",
        Table::Files => "file",
    }
}

/// Read helpers shared by both guards.
pub trait Access {
    /// Execute one statement under the held lock.
    fn execute(&mut self, statement: &Statement) -> Result<Outcome>;

    /// Rows matching `filter`, in ascending id order.
    fn fetch_rows(
        &mut self,
        table: Table,
        projection: Projection,
        filter: Filter,
    ) -> Result<Vec<Row>> {
        Ok(self
            .execute(&Statement::Select {
                table,
                projection,
                filter,
            })?
            .rows)
    }

    /// The row with `id`; `NotFound` if there is none.
    fn fetch_row(&mut self, table: Table, projection: Projection, id: MeowId) -> Result<Row> {
        self.fetch_rows(table, projection, Filter::Id(id))?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound { kind: kind(table), id }.into())
    }

    /// One column of the row with `id`.
    fn fetch_field<T: FromValue>(
        &mut self,
        table: Table,
        id: MeowId,
        column: &'static str,
    ) -> Result<T> {
        debug!(table = table.name(), %id, column, "Loading field");
        let row = self.fetch_row(table, Projection::Columns(vec![column]), id)?;
        T::from_value(row.get(column).unwrap_or(&Value::Null))
    }

    /// Whether a row with `id` exists.
    fn exists(&mut self, table: Table, id: MeowId) -> Result<bool> {
        Ok(!self
            .fetch_rows(table, Projection::Columns(vec!["id"]), Filter::Id(id))?
            .is_empty())
    }
}

/// Shared access to the store.
pub struct ReadGuard<'a> {
    backend: &'a dyn BackendImpl,
    _lock: RwLockReadGuard<'a, ()>,
}

impl Access for ReadGuard<'_> {
    fn execute(&mut self, statement: &Statement) -> Result<Outcome> {
        if statement.is_write() {
            return Err(StoreError::PermissionDenied {
                operation: "write under a read lock",
            }
            .into());
        }
        self.backend.execute(statement)
    }
}

/// Exclusive access to the store.
pub struct WriteGuard<'a> {
    backend: &'a dyn BackendImpl,
    _lock: RwLockWriteGuard<'a, ()>,
    dirty: bool,
}

impl WriteGuard<'_> {
    /// Insert a full row.
    pub fn insert(&mut self, table: Table, row: Row) -> Result<()> {
        self.execute(&Statement::Insert { table, row })?;
        Ok(())
    }

    /// Write one column of the row with `id`; `NotFound` if there is none.
    pub fn update_field(
        &mut self,
        table: Table,
        id: MeowId,
        column: &'static str,
        value: Value,
    ) -> Result<()> {
        debug!(table = table.name(), %id, column, "Writing field");
        let outcome = self.execute(&Statement::Update {
            table,
            id,
            column,
            value,
        })?;
        if outcome.affected == 0 {
            return Err(StoreError::NotFound { kind: kind(table), id }.into());
        }
        Ok(())
    }

    /// Delete matching rows and return how many went away.
    pub fn delete(&mut self, table: Table, filter: Filter) -> Result<u64> {
        Ok(self.execute(&Statement::Delete { table, filter })?.affected)
    }

    /// Commit every write made through this guard, then release the lock.
    pub fn commit(mut self) -> Result<()> {
        self.backend.commit()?;
        self.dirty = false;
        Ok(())
    }
}

impl Access for WriteGuard<'_> {
    fn execute(&mut self, statement: &Statement) -> Result<Outcome> {
        if statement.is_write() {
            self.dirty = true;
        }
        self.backend.execute(statement)
    }
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        if self.dirty {
            warn!("Rolling back uncommitted writes");
            if let Err(err) = self.backend.rollback() {
                warn!(%err, "Rollback failed");
            }
        }
    }
}
