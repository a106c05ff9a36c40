//! Backend implementations for purrcafe storage
//!
//! This module provides the core `BackendImpl` trait and its implementations.
//!
//! The `BackendImpl` trait is the persistent store interface the [`Store`](crate::Store)
//! talks to: it executes closed, parameterized [`Statement`]s against a fixed
//! three-table schema and exposes explicit `commit`/`rollback`. Table and
//! column names only ever come from [`Table`]; caller-supplied data only ever
//! travels as [`Value`] parameters.

use std::any::Any;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{MeowId, Result};

pub mod database;
pub mod errors;
pub mod value;

pub use errors::BackendError;
pub use value::{FromValue, Value};

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Text,
    Blob,
}

/// One column of the fixed schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub nullable: bool,
}

const fn column(name: &'static str, kind: ColumnKind, nullable: bool) -> Column {
    Column {
        name,
        kind,
        nullable,
    }
}

const USERS_COLUMNS: &[Column] = &[
    column("id", ColumnKind::Integer, false),
    column("name", ColumnKind::Text, false),
    column("email", ColumnKind::Text, false),
    column("password_hash", ColumnKind::Text, false),
    column("creation_time", ColumnKind::Integer, false),
];

const SESSIONS_COLUMNS: &[Column] = &[
    column("id", ColumnKind::Integer, false),
    column("owner_id", ColumnKind::Integer, false),
    column("creation_time", ColumnKind::Integer, false),
    column("expiration_time", ColumnKind::Integer, true),
];

const FILES_COLUMNS: &[Column] = &[
    column("id", ColumnKind::Integer, false),
    column("uploader_id", ColumnKind::Integer, false),
    column("uploader_hidden", ColumnKind::Integer, false),
    column("upload_time", ColumnKind::Integer, false),
    column("expiration_time", ColumnKind::Integer, true),
    column("filename", ColumnKind::Text, true),
    column("data", ColumnKind::Blob, false),
    column("size", ColumnKind::Integer, false),
    column("data_hash", ColumnKind::Text, false),
    column("mime_type", ColumnKind::Text, false),
    column("max_access_count", ColumnKind::Integer, true),
    column("access_count", ColumnKind::Integer, false),
    column("meta_access_count", ColumnKind::Integer, false),
];

/// The tables of the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Users,
    Sessions,
    Files,
}

impl Table {
    /// Every table, in creation order.
    pub const ALL: [Table; 3] = [Table::Users, Table::Sessions, Table::Files];

    /// SQL name of the table.
    pub fn name(self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Sessions => "sessions",
            Table::Files => "files",
        }
    }

    /// Columns of the table; the first is always the `id` primary key.
    pub fn columns(self) -> &'static [Column] {
        match self {
            Table::Users => USERS_COLUMNS,
            Table::Sessions => SESSIONS_COLUMNS,
            Table::Files => FILES_COLUMNS,
        }
    }

    /// Look up a column by name.
    pub fn column(self, name: &str) -> Result<&'static Column> {
        self.columns()
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| {
                BackendError::UnknownColumn {
                    table: self.name(),
                    column: name.to_string(),
                }
                .into()
            })
    }
}

/// A row keyed by column name.
pub type Row = BTreeMap<String, Value>;

/// Which columns a select returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// Every column of the table.
    All,
    /// Every column except the named one.
    AllExcept(&'static str),
    /// Only the named columns.
    Columns(Vec<&'static str>),
}

/// Which rows a statement applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Every row.
    All,
    /// The row with this primary key.
    Id(MeowId),
    /// Rows whose column equals the value.
    Eq(&'static str, Value),
}

/// A closed, parameterized statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Select {
        table: Table,
        projection: Projection,
        filter: Filter,
    },
    Insert {
        table: Table,
        row: Row,
    },
    Update {
        table: Table,
        id: MeowId,
        column: &'static str,
        value: Value,
    },
    Delete {
        table: Table,
        filter: Filter,
    },
}

impl Statement {
    /// The table the statement targets.
    pub fn table(&self) -> Table {
        match self {
            Statement::Select { table, .. }
            | Statement::Insert { table, .. }
            | Statement::Update { table, .. }
            | Statement::Delete { table, .. } => *table,
        }
    }

    /// Whether the statement modifies data.
    pub fn is_write(&self) -> bool {
        !matches!(self, Statement::Select { .. })
    }

    /// Columns a select returns, in schema order.
    pub(crate) fn selected_columns(table: Table, projection: &Projection) -> Vec<&'static Column> {
        table
            .columns()
            .iter()
            .filter(|c| match projection {
                Projection::All => true,
                Projection::AllExcept(name) => c.name != *name,
                Projection::Columns(names) => names.contains(&c.name),
            })
            .collect()
    }

    /// Check every column name against the schema.
    pub fn validate(&self) -> Result<()> {
        let table = self.table();
        let check_filter = |filter: &Filter| match filter {
            Filter::Eq(name, _) => table.column(name).map(|_| ()),
            Filter::All | Filter::Id(_) => Ok(()),
        };
        match self {
            Statement::Select {
                projection, filter, ..
            } => {
                match projection {
                    Projection::All => {}
                    Projection::AllExcept(name) => {
                        table.column(name)?;
                    }
                    Projection::Columns(names) => {
                        for name in names {
                            table.column(name)?;
                        }
                    }
                }
                check_filter(filter)
            }
            Statement::Insert { row, .. } => {
                for name in row.keys() {
                    table.column(name)?;
                }
                Ok(())
            }
            Statement::Update { column, .. } => {
                if *column == "id" {
                    return Err(BackendError::InvalidValue {
                        reason: format!("primary key of {} cannot be updated", table.name()),
                    }
                    .into());
                }
                table.column(column).map(|_| ())
            }
            Statement::Delete { filter, .. } => check_filter(filter),
        }
    }
}

/// Result of executing a statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Rows returned by a select, in ascending id order.
    pub rows: Vec<Row>,
    /// Rows inserted, updated or deleted by a write.
    pub affected: u64,
}

/// BackendImpl trait abstracting the underlying storage mechanism.
///
/// Writes become visible to later statements immediately but only become
/// durable on `commit`; `rollback` discards every write since the last
/// commit. Callers serialize access themselves: the trait makes no promise
/// about interleaving writes from different threads between two commits.
///
/// All backend implementations must be `Send` and `Sync` to allow sharing across threads,
/// and implement `Any` to allow for downcasting if needed.
pub trait BackendImpl: Send + Sync + Any {
    /// Execute one statement.
    fn execute(&self, statement: &Statement) -> Result<Outcome>;

    /// Make every write since the last commit or rollback durable.
    fn commit(&self) -> Result<()>;

    /// Discard every write since the last commit or rollback.
    fn rollback(&self) -> Result<()>;

    /// Returns a reference to the backend instance as a dynamic `Any` type.
    ///
    /// This allows for downcasting to a concrete backend implementation if necessary,
    /// enabling access to implementation-specific methods like `InMemory::save_to_file`.
    fn as_any(&self) -> &dyn Any;
}
