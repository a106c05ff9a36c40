//! In-memory database backend implementation
//!
//! This module provides an in-memory implementation of the BackendImpl trait,
//! suitable for testing, development, or single-process deployments that
//! persist by saving the whole state to a JSON file.

mod persistence;

use std::any::Any;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, PoisonError, RwLock};

use tracing::debug;

use crate::backend::{
    BackendError, BackendImpl, Filter, Outcome, Row, Statement, Table, Value,
};
use crate::{MeowId, Result};

/// Rows of one table keyed by primary key.
pub(crate) type TableRows = BTreeMap<MeowId, Row>;

/// How to reverse one uncommitted write.
#[derive(Debug)]
enum Undo {
    /// Remove a row that was inserted.
    Remove(Table, MeowId),
    /// Put back a row that was deleted.
    Restore(Table, MeowId, Row),
    /// Put back the previous value of one updated column.
    Revert(Table, MeowId, String, Value),
}

impl Undo {
    fn apply(&self, tables: &mut BTreeMap<Table, TableRows>) {
        match self {
            Undo::Remove(table, id) => {
                if let Some(rows) = tables.get_mut(table) {
                    rows.remove(id);
                }
            }
            Undo::Restore(table, id, row) => {
                tables.entry(*table).or_default().insert(*id, row.clone());
            }
            Undo::Revert(table, id, column, value) => {
                if let Some(row) = tables.get_mut(table).and_then(|rows| rows.get_mut(id)) {
                    row.insert(column.clone(), value.clone());
                }
            }
        }
    }
}

/// A simple in-memory database implementation using ordered maps for storage.
///
/// Writes are applied immediately and recorded in an undo log; `commit`
/// forgets the log and `rollback` replays it backwards.
///
/// It provides basic persistence capabilities via `save_to_file` and
/// `load_from_file`, serializing the tables to JSON.
#[derive(Debug, Default)]
pub struct InMemory {
    pub(crate) tables: RwLock<BTreeMap<Table, TableRows>>,
    undo: Mutex<Vec<Undo>>,
}

impl InMemory {
    /// Creates a new, empty `InMemory` database.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_tables(tables: BTreeMap<Table, TableRows>) -> Self {
        Self {
            tables: RwLock::new(tables),
            undo: Mutex::new(Vec::new()),
        }
    }

    /// Number of rows currently stored in a table.
    pub fn row_count(&self, table: Table) -> usize {
        self.read_tables().get(&table).map_or(0, BTreeMap::len)
    }

    /// Whether there are writes that were neither committed nor rolled back.
    pub fn has_pending_writes(&self) -> bool {
        !self.undo_log().is_empty()
    }

    /// Saves the entire database state to a specified file as JSON.
    ///
    /// # Arguments
    /// * `path` - The path to the file where the state should be saved.
    ///
    /// # Returns
    /// A `Result` indicating success or an I/O or serialization error.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        persistence::save_to_file(self, path)
    }

    /// Loads the database state from a specified JSON file.
    ///
    /// If the file does not exist, a new, empty `InMemory` database is returned.
    ///
    /// # Arguments
    /// * `path` - The path to the file from which to load the state.
    ///
    /// # Returns
    /// A `Result` containing the loaded `InMemory` database or an I/O or deserialization error.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        persistence::load_from_file(path)
    }

    /// Copy of the tables with every uncommitted write undone.
    pub(crate) fn committed_tables(&self) -> BTreeMap<Table, TableRows> {
        let tables = self.read_tables();
        let undo = self.undo_log();
        let mut committed = tables.clone();
        for step in undo.iter().rev() {
            step.apply(&mut committed);
        }
        committed
    }

    pub(crate) fn read_tables(
        &self,
    ) -> std::sync::RwLockReadGuard<'_, BTreeMap<Table, TableRows>> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_tables(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<Table, TableRows>> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn undo_log(&self) -> std::sync::MutexGuard<'_, Vec<Undo>> {
        self.undo.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn select(&self, statement: &Statement) -> Outcome {
        let Statement::Select {
            table,
            projection,
            filter,
        } = statement
        else {
            return Outcome::default();
        };
        let columns = Statement::selected_columns(*table, projection);
        let tables = self.read_tables();
        let rows = tables
            .get(table)
            .into_iter()
            .flat_map(|rows| rows.iter())
            .filter(|(id, row)| filter_matches(filter, **id, row))
            .map(|(_, row)| {
                columns
                    .iter()
                    .map(|c| {
                        let value = row.get(c.name).cloned().unwrap_or(Value::Null);
                        (c.name.to_string(), value)
                    })
                    .collect()
            })
            .collect();
        Outcome { rows, affected: 0 }
    }

    fn insert(&self, table: Table, row: &Row) -> Result<Outcome> {
        let mut full = Row::new();
        for column in table.columns() {
            let value = row.get(column.name).cloned().unwrap_or(Value::Null);
            if value.is_null() && !column.nullable {
                return Err(BackendError::InvalidRow {
                    table: table.name(),
                    reason: format!("column {} must not be null", column.name),
                }
                .into());
            }
            full.insert(column.name.to_string(), value);
        }
        let id = row_id(table, &full)?;

        let mut tables = self.write_tables();
        let rows = tables.entry(table).or_default();
        if rows.contains_key(&id) {
            return Err(BackendError::DuplicateKey {
                table: table.name(),
                id,
            }
            .into());
        }
        rows.insert(id, full);
        self.undo_log().push(Undo::Remove(table, id));
        Ok(Outcome {
            rows: Vec::new(),
            affected: 1,
        })
    }

    fn update(&self, table: Table, id: MeowId, column: &str, value: &Value) -> Result<Outcome> {
        if value.is_null() && !table.column(column)?.nullable {
            return Err(BackendError::InvalidValue {
                reason: format!("column {column} of {} must not be null", table.name()),
            }
            .into());
        }
        let mut tables = self.write_tables();
        let Some(row) = tables.get_mut(&table).and_then(|rows| rows.get_mut(&id)) else {
            return Ok(Outcome::default());
        };
        let previous = row
            .insert(column.to_string(), value.clone())
            .unwrap_or(Value::Null);
        self.undo_log()
            .push(Undo::Revert(table, id, column.to_string(), previous));
        Ok(Outcome {
            rows: Vec::new(),
            affected: 1,
        })
    }

    fn delete(&self, table: Table, filter: &Filter) -> Outcome {
        let mut tables = self.write_tables();
        let Some(rows) = tables.get_mut(&table) else {
            return Outcome::default();
        };
        let doomed: Vec<MeowId> = rows
            .iter()
            .filter(|(id, row)| filter_matches(filter, **id, row))
            .map(|(id, _)| *id)
            .collect();
        let mut undo = self.undo_log();
        for id in &doomed {
            if let Some(row) = rows.remove(id) {
                undo.push(Undo::Restore(table, *id, row));
            }
        }
        Outcome {
            rows: Vec::new(),
            affected: doomed.len() as u64,
        }
    }
}

/// SQL-style equality: `NULL` never matches.
fn filter_matches(filter: &Filter, id: MeowId, row: &Row) -> bool {
    match filter {
        Filter::All => true,
        Filter::Id(wanted) => *wanted == id,
        Filter::Eq(column, value) => {
            !value.is_null() && row.get(*column).is_some_and(|v| v == value)
        }
    }
}

pub(crate) fn row_id(table: Table, row: &Row) -> Result<MeowId> {
    match row.get("id") {
        Some(Value::Integer(v)) => Ok(MeowId::from_int(*v as u64)),
        _ => Err(BackendError::InvalidRow {
            table: table.name(),
            reason: "missing integer id".to_string(),
        }
        .into()),
    }
}

impl BackendImpl for InMemory {
    fn execute(&self, statement: &Statement) -> Result<Outcome> {
        statement.validate()?;
        match statement {
            Statement::Select { .. } => Ok(self.select(statement)),
            Statement::Insert { table, row } => self.insert(*table, row),
            Statement::Update {
                table,
                id,
                column,
                value,
            } => self.update(*table, *id, column, value),
            Statement::Delete { table, filter } => Ok(self.delete(*table, filter)),
        }
    }

    fn commit(&self) -> Result<()> {
        let mut undo = self.undo_log();
        if !undo.is_empty() {
            debug!(writes = undo.len(), "Committing in-memory writes");
        }
        undo.clear();
        Ok(())
    }

    fn rollback(&self) -> Result<()> {
        let mut tables = self.write_tables();
        let mut undo = self.undo_log();
        debug!(writes = undo.len(), "Rolling back in-memory writes");
        while let Some(step) = undo.pop() {
            step.apply(&mut tables);
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
