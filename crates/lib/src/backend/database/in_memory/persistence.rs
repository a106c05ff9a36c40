//! Persistence operations for InMemory database
//!
//! This module handles serialization and file I/O for saving/loading
//! the in-memory database state to/from JSON files.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

use super::{InMemory, TableRows, row_id};
use crate::{
    Error, Result,
    backend::{BackendError, Row, Table},
};

/// The current persistence file format version.
/// v0 indicates this is an unstable format subject to breaking changes.
const PERSISTENCE_VERSION: u8 = 0;

/// Helper to check if version is default (0) for serde skip_serializing_if
fn is_v0(v: &u8) -> bool {
    *v == 0
}

/// Validates the persistence version during deserialization.
fn validate_persistence_version<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let version = u8::deserialize(deserializer)?;
    if version != PERSISTENCE_VERSION {
        return Err(serde::de::Error::custom(format!(
            "unsupported persistence version {version}; only version {PERSISTENCE_VERSION} is supported"
        )));
    }
    Ok(version)
}

/// Serializable version of InMemory database for persistence
#[derive(Serialize, Deserialize)]
struct SerializableDatabase {
    /// File format version for compatibility checking
    #[serde(
        rename = "_v",
        default,
        skip_serializing_if = "is_v0",
        deserialize_with = "validate_persistence_version"
    )]
    version: u8,
    #[serde(default)]
    tables: BTreeMap<Table, Vec<Row>>,
}

/// Saves the committed database state to a specified file as JSON.
///
/// Writes that are still pending are left out, so a later rollback never
/// leaves rows on disk that the live database no longer has.
pub(crate) fn save_to_file<P: AsRef<Path>>(backend: &InMemory, path: P) -> Result<()> {
    let tables = backend
        .committed_tables()
        .into_iter()
        .map(|(table, rows)| (table, rows.into_values().collect()))
        .collect();

    let serializable = SerializableDatabase {
        version: PERSISTENCE_VERSION,
        tables,
    };

    let json = serde_json::to_string_pretty(&serializable)
        .map_err(|e| -> Error { BackendError::SerializationFailed { source: e }.into() })?;
    std::fs::write(path.as_ref(), json)
        .map_err(|e| -> Error { BackendError::FileIo { source: e }.into() })?;
    info!(path = %path.as_ref().display(), "Saved in-memory database");
    Ok(())
}

/// Loads the database state from a specified JSON file.
///
/// If the file does not exist, a new, empty `InMemory` database is returned.
pub(crate) fn load_from_file<P: AsRef<Path>>(path: P) -> Result<InMemory> {
    let json = match std::fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(InMemory::new()),
        Err(e) => return Err(BackendError::FileIo { source: e }.into()),
    };

    let serializable: SerializableDatabase = serde_json::from_str(&json)
        .map_err(|e| -> Error { BackendError::DeserializationFailed { source: e }.into() })?;

    let mut tables = BTreeMap::new();
    for (table, rows) in serializable.tables {
        let mut keyed = TableRows::new();
        for row in rows {
            for name in row.keys() {
                table.column(name)?;
            }
            keyed.insert(row_id(table, &row)?, row);
        }
        tables.insert(table, keyed);
    }
    Ok(InMemory::from_tables(tables))
}
