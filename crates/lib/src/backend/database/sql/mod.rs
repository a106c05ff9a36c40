//! SQL-based backend implementation for purrcafe storage.
//!
//! This module provides a SQLite backend that implements the `BackendImpl`
//! trait on top of sqlx's `AnyPool`.
//!
//! ## Architecture
//!
//! `BackendImpl` is synchronous, so the backend owns a tokio runtime and
//! blocks on it for every statement. Methods must therefore be called from
//! blocking (non-async) contexts; constructors work from either.
//!
//! The first write after a commit opens a pool transaction. Every later
//! statement, reads included, runs on that transaction until `commit` or
//! `rollback` ends it. While no transaction is open, reads go straight to the
//! pool and never touch the transaction mutex, so concurrent readers do not
//! queue behind each other.
//!
//! ## Schema and Migrations
//!
//! The database schema is defined in the [`schema`] module and automatically
//! initialized when connecting.

mod statement;

/// Schema definition and migration system.
pub mod schema;

use std::any::Any;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::{Any as AnyDb, AnyPool, Row as _, Transaction};
use tokio::runtime::Runtime;
use tracing::debug;

use crate::backend::{
    BackendError, BackendImpl, ColumnKind, FromValue, Outcome, Row, Statement, Table, Value,
};
use crate::{MeowId, Result};
use statement::{Rendered, render};

/// Extension trait for sqlx Result types to simplify error handling.
///
/// Similar to `anyhow::Context`, this trait adds a method to convert
/// sqlx errors to `BackendError::SqlxError` with a context message.
pub(crate) trait SqlxResultExt<T> {
    /// Convert sqlx error to BackendError with context message.
    fn sql_context(self, context: &str) -> Result<T>;
}

impl<T> SqlxResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn sql_context(self, context: &str) -> Result<T> {
        self.map_err(|e| {
            BackendError::SqlxError {
                reason: format!("{context}: {e}"),
                source: Some(e),
            }
            .into()
        })
    }
}

fn runtime_error(e: impl std::fmt::Display) -> crate::Error {
    BackendError::SqlxError {
        reason: format!("Failed to create tokio runtime: {e}"),
        source: None,
    }
    .into()
}

/// SQL-based backend implementing `BackendImpl` using sqlx.
///
/// # Thread Safety
///
/// `SqlxBackend` is `Send + Sync` as required by `BackendImpl`. The open
/// transaction sits behind a mutex; the [`Store`](crate::Store) lock keeps
/// writers from interleaving between two commits. `in_transaction` mirrors
/// whether that mutex holds a transaction and only changes under the store's
/// writer lock.
pub struct SqlxBackend {
    pool: AnyPool,
    tx: Mutex<Option<Transaction<'static, AnyDb>>>,
    in_transaction: AtomicBool,
    /// Owned runtime; only `None` while dropping.
    runtime: Option<Arc<Runtime>>,
}

impl std::fmt::Debug for SqlxBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlxBackend")
            .field("pool_size", &self.pool.size())
            .field(
                "in_transaction",
                &self.tx.try_lock().map(|tx| tx.is_some()).ok(),
            )
            .finish()
    }
}

impl SqlxBackend {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use purrcafe::backend::database::SqlxBackend;
    ///
    /// let backend = SqlxBackend::open_sqlite("purrcafe.db").unwrap();
    /// ```
    pub fn open_sqlite<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        // mode=rwc: read-write-create (create file if it doesn't exist)
        let url = format!("sqlite:{}?mode=rwc", path.as_ref().display());
        Self::connect_sqlite(&url)
    }

    /// Connect to a SQLite database using a connection URL.
    ///
    /// # Arguments
    ///
    /// * `url` - SQLite connection URL (e.g., "sqlite:./my.db")
    pub fn connect_sqlite(url: &str) -> Result<Self> {
        let url = url.to_string();
        if tokio::runtime::Handle::try_current().is_ok() {
            // A runtime cannot be created or blocked on from inside another
            // one, so build the backend on a plain thread.
            std::thread::spawn(move || Self::build(&url))
                .join()
                .map_err(|_| runtime_error("backend construction thread panicked"))?
        } else {
            Self::build(&url)
        }
    }

    /// Create an in-memory SQLite database.
    ///
    /// The database exists only for the lifetime of this backend instance.
    /// Useful for testing.
    ///
    /// # Example
    ///
    /// ```
    /// use purrcafe::backend::database::SqlxBackend;
    ///
    /// let backend = SqlxBackend::in_memory().unwrap();
    /// ```
    pub fn in_memory() -> Result<Self> {
        // Shared cache so all pool connections see one database; a unique
        // name per instance so tests don't share state.
        let unique_id = uuid::Uuid::new_v4();
        Self::connect_sqlite(&format!(
            "sqlite:file:mem_{unique_id}?mode=memory&cache=shared"
        ))
    }

    fn build(url: &str) -> Result<Self> {
        let runtime = Arc::new(Runtime::new().map_err(runtime_error)?);
        let pool = runtime.block_on(connect_pool(url))?;
        Ok(Self {
            pool,
            tx: Mutex::new(None),
            in_transaction: AtomicBool::new(false),
            runtime: Some(runtime),
        })
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    fn transaction(&self) -> MutexGuard<'_, Option<Transaction<'static, AnyDb>>> {
        self.tx.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take the open transaction, if any, so it can be committed or rolled back.
    fn finish_transaction(&self) -> Option<Transaction<'static, AnyDb>> {
        let mut tx = self.transaction();
        self.in_transaction.store(false, Ordering::Release);
        tx.take()
    }

    fn block_on<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match &self.runtime {
            Some(runtime) => runtime.block_on(fut),
            None => Err(runtime_error("runtime already shut down")),
        }
    }

    fn select(&self, table: Table, statement: &Statement, rendered: &Rendered) -> Result<Outcome> {
        let Statement::Select { projection, .. } = statement else {
            return Ok(Outcome::default());
        };
        let columns = Statement::selected_columns(table, projection);
        let context = format!("Failed to select from {}", table.name());
        let sql_rows = if self.in_transaction.load(Ordering::Acquire) {
            let mut tx = self.transaction();
            self.block_on(async {
                let query = bind_all(sqlx::query(&rendered.sql), &rendered.params);
                match tx.as_mut() {
                    Some(tx) => query.fetch_all(&mut **tx).await,
                    None => query.fetch_all(&self.pool).await,
                }
                .sql_context(&context)
            })?
        } else {
            self.block_on(async {
                bind_all(sqlx::query(&rendered.sql), &rendered.params)
                    .fetch_all(&self.pool)
                    .await
                    .sql_context(&context)
            })?
        };

        let rows = sql_rows
            .iter()
            .map(|sql_row| {
                columns
                    .iter()
                    .map(|c| Ok((c.name.to_string(), decode(sql_row, c.name, c.kind)?)))
                    .collect::<Result<Row>>()
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Outcome { rows, affected: 0 })
    }

    fn write(&self, table: Table, statement: &Statement, rendered: &Rendered) -> Result<Outcome> {
        let mut tx = self.transaction();
        let affected = self.block_on(async {
            if tx.is_none() {
                let begun = self
                    .pool
                    .begin()
                    .await
                    .sql_context("Failed to begin transaction")?;
                *tx = Some(begun);
                self.in_transaction.store(true, Ordering::Release);
            }
            let Some(open) = tx.as_mut() else {
                return Ok(0);
            };
            let result = bind_all(sqlx::query(&rendered.sql), &rendered.params)
                .execute(&mut **open)
                .await;
            match result {
                Ok(done) => Ok(done.rows_affected()),
                Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                    let id = match statement {
                        Statement::Insert { row, .. } => row
                            .get("id")
                            .and_then(|v| MeowId::from_value(v).ok())
                            .unwrap_or_default(),
                        _ => Default::default(),
                    };
                    Err(BackendError::DuplicateKey {
                        table: table.name(),
                        id,
                    }
                    .into())
                }
                Err(e) => Err(e).sql_context(&format!("Failed to write to {}", table.name())),
            }
        })?;
        Ok(Outcome {
            rows: Vec::new(),
            affected,
        })
    }
}

/// Build the pool, apply pragmas and initialize the schema.
async fn connect_pool(url: &str) -> Result<AnyPool> {
    // Install any driver support
    sqlx::any::install_default_drivers();

    let is_in_memory = url.contains("mode=memory");

    // An in-memory database with shared cache is destroyed when its last
    // connection closes, so keep one connection alive for the pool's lifetime.
    let pool = if is_in_memory {
        AnyPoolOptions::new()
            .max_connections(5)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(url)
            .await
            .sql_context("Failed to connect to SQLite")?
    } else {
        AnyPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .sql_context("Failed to connect to SQLite")?
    };

    if is_in_memory {
        sqlx::query("PRAGMA busy_timeout = 5000;")
            .execute(&pool)
            .await
            .sql_context("Failed to configure SQLite")?;
    } else {
        // - journal_mode=WAL: Write-Ahead Logging for better concurrency
        // - synchronous=NORMAL: Balanced durability (safe with WAL)
        // - busy_timeout=5000: Wait up to 5s for locks before failing
        sqlx::query(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )
        .execute(&pool)
        .await
        .sql_context("Failed to configure SQLite")?;
    }

    schema::initialize(&pool).await?;
    Ok(pool)
}

fn bind_all<'q>(
    mut query: sqlx::query::Query<'q, AnyDb, sqlx::any::AnyArguments<'q>>,
    params: &[Value],
) -> sqlx::query::Query<'q, AnyDb, sqlx::any::AnyArguments<'q>> {
    for param in params {
        query = match param {
            Value::Null => query.bind(None::<i64>),
            Value::Integer(v) => query.bind(*v),
            Value::Text(v) => query.bind(v.clone()),
            Value::Blob(v) => query.bind(v.clone()),
        };
    }
    query
}

fn decode(row: &AnyRow, column: &str, kind: ColumnKind) -> Result<Value> {
    let context = format!("Failed to decode column {column}");
    let value = match kind {
        ColumnKind::Integer => row
            .try_get::<Option<i64>, _>(column)
            .sql_context(&context)?
            .map(Value::Integer),
        ColumnKind::Text => row
            .try_get::<Option<String>, _>(column)
            .sql_context(&context)?
            .map(Value::Text),
        ColumnKind::Blob => row
            .try_get::<Option<Vec<u8>>, _>(column)
            .sql_context(&context)?
            .map(Value::Blob),
    };
    Ok(value.unwrap_or(Value::Null))
}

impl BackendImpl for SqlxBackend {
    fn execute(&self, statement: &Statement) -> Result<Outcome> {
        statement.validate()?;
        let table = statement.table();
        let rendered = render(statement);
        debug!(sql = %rendered.sql, params = rendered.params.len(), "Executing statement");
        if statement.is_write() {
            self.write(table, statement, &rendered)
        } else {
            self.select(table, statement, &rendered)
        }
    }

    fn commit(&self) -> Result<()> {
        let Some(tx) = self.finish_transaction() else {
            return Ok(());
        };
        self.block_on(async { tx.commit().await.sql_context("Failed to commit transaction") })
    }

    fn rollback(&self) -> Result<()> {
        let Some(tx) = self.finish_transaction() else {
            return Ok(());
        };
        self.block_on(async {
            tx.rollback()
                .await
                .sql_context("Failed to roll back transaction")
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for SqlxBackend {
    fn drop(&mut self) {
        let tx = self
            .tx
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(runtime) = self.runtime.take() else {
            return;
        };
        let pool = self.pool.clone();
        let shutdown = move || {
            runtime.block_on(async move {
                if let Some(tx) = tx {
                    let _ = tx.rollback().await;
                }
                pool.close().await;
            });
            drop(runtime);
        };
        if tokio::runtime::Handle::try_current().is_ok() {
            // Blocking on the owned runtime is not allowed from inside another
            // runtime, so shut down on a separate thread.
            std::thread::spawn(shutdown);
        } else {
            shutdown();
        }
    }
}

/// Convenience type alias for SQLite backend using sqlx.
pub type Sqlite = SqlxBackend;
