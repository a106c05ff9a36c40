//! SQL schema definitions and migrations.
//!
//! This module contains the database schema used by the SQL backend. Column
//! names and nullability mirror [`Table::columns`](crate::backend::Table::columns).
//!
//! # Migration System
//!
//! Migrations are code-based functions rather than SQL files. Each migration
//! receives the pool and can execute whatever SQL it needs.
//!
//! ## Adding a New Migration
//!
//! 1. Increment `SCHEMA_VERSION`
//! 2. Add a new `migrate_vN_to_vM` async function
//! 3. Add the migration to the match statement in `run_migration`
//! 4. Document what the migration does

use sqlx::AnyPool;
use tracing::info;

use super::SqlxResultExt;
use crate::Result;
use crate::backend::BackendError;

/// Current schema version.
///
/// Increment this when making schema changes that require migration.
pub const SCHEMA_VERSION: i64 = 1;

/// SQL statements to create the schema tables.
///
/// Identifiers are the packed 64-bit MeowID bit-cast to BIGINT. Times are
/// whole seconds since the Unix epoch, flags are 0/1.
pub const CREATE_TABLES: &[&str] = &[
    // Schema version tracking
    "CREATE TABLE IF NOT EXISTS schema_version (
        version BIGINT PRIMARY KEY
    )",
    "CREATE TABLE IF NOT EXISTS users (
        id BIGINT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        creation_time BIGINT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS sessions (
        id BIGINT PRIMARY KEY NOT NULL,
        owner_id BIGINT NOT NULL,
        creation_time BIGINT NOT NULL,
        expiration_time BIGINT
    )",
    // Payloads live inline; the largest allowed upload is 30 MiB
    "CREATE TABLE IF NOT EXISTS files (
        id BIGINT PRIMARY KEY NOT NULL,
        uploader_id BIGINT NOT NULL,
        uploader_hidden BIGINT NOT NULL DEFAULT 0,
        upload_time BIGINT NOT NULL,
        expiration_time BIGINT,
        filename TEXT,
        data BLOB NOT NULL,
        size BIGINT NOT NULL DEFAULT 0,
        data_hash TEXT NOT NULL,
        mime_type TEXT NOT NULL,
        max_access_count BIGINT,
        access_count BIGINT NOT NULL DEFAULT 0,
        meta_access_count BIGINT NOT NULL DEFAULT 0
    )",
];

/// SQL statements to create indexes.
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_users_name ON users(name)",
    "CREATE INDEX IF NOT EXISTS idx_sessions_owner ON sessions(owner_id)",
    "CREATE INDEX IF NOT EXISTS idx_files_uploader ON files(uploader_id)",
];

/// Initialize the database schema.
///
/// Creates tables and indexes if they don't exist, and handles migrations
/// if the schema version has changed.
pub async fn initialize(pool: &AnyPool) -> Result<()> {
    for statement in CREATE_TABLES {
        sqlx::query(statement)
            .execute(pool)
            .await
            .sql_context(&format!("Schema creation failed - SQL: {statement}"))?;
    }

    let row: Option<(i64,)> = sqlx::query_as("SELECT version FROM schema_version")
        .fetch_optional(pool)
        .await
        .sql_context("Failed to check schema version")?;

    match row {
        None => {
            sqlx::query("INSERT INTO schema_version (version) VALUES ($1)")
                .bind(SCHEMA_VERSION)
                .execute(pool)
                .await
                .sql_context("Failed to initialize schema version")?;
            info!(version = SCHEMA_VERSION, "Initialized SQL schema");
        }
        Some((current,)) if current < SCHEMA_VERSION => {
            migrate(pool, current, SCHEMA_VERSION).await?;
        }
        Some((current,)) if current > SCHEMA_VERSION => {
            return Err(BackendError::SqlxError {
                reason: format!(
                    "Database schema v{current} is newer than supported v{SCHEMA_VERSION}"
                ),
                source: None,
            }
            .into());
        }
        Some(_) => {}
    }

    for statement in CREATE_INDEXES {
        sqlx::query(statement)
            .execute(pool)
            .await
            .sql_context(&format!("Index creation failed - SQL: {statement}"))?;
    }

    Ok(())
}

/// Run migrations sequentially from one schema version to another.
///
/// Migrations are run one at a time, incrementing the version after each.
async fn migrate(pool: &AnyPool, from: i64, to: i64) -> Result<()> {
    info!(from, to, "Starting SQL schema migration");

    let mut current = from;
    while current < to {
        let next = current + 1;
        info!(from = current, to = next, "Running migration");

        run_migration(pool, current, next).await?;

        sqlx::query("UPDATE schema_version SET version = $1")
            .bind(next)
            .execute(pool)
            .await
            .sql_context(&format!("Failed to update schema version to {next}"))?;

        info!(version = next, "Migration completed");
        current = next;
    }

    info!(from, to, "All migrations completed successfully");
    Ok(())
}

/// Execute a single migration step.
///
/// Add new migrations here as match arms, e.g. `1 => migrate_v1_to_v2(pool).await`.
async fn run_migration(pool: &AnyPool, from: i64, to: i64) -> Result<()> {
    // No migrations exist yet; version 1 is the first schema.
    let _ = pool;

    Err(BackendError::SqlxError {
        reason: format!(
            "Unknown migration path: v{from} to v{to}. \
             This likely means SCHEMA_VERSION was incremented without adding a migration."
        ),
        source: None,
    }
    .into())
}
