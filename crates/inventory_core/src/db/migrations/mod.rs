//! SQLite schema registry and executor.
//!
//! # Responsibility
//! - Register schema scripts in strictly increasing version order.
//! - Bring a connection to `SCHEMA_VERSION`, atomically.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied version is mirrored to `PRAGMA user_version`.
//! - There are no upgrade paths: any stored version other than the current
//!   one is resolved by dropping every table and recreating the schema empty.

use crate::db::DbResult;
use log::{info, warn};
use rusqlite::{Connection, Transaction};

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("0001_init.sql"),
}];

/// Schema version this binary writes and expects.
pub const SCHEMA_VERSION: u32 = 1;

/// What `apply_migrations` did to the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaOutcome {
    /// Empty database; schema created from scratch.
    Created,
    /// Stored schema already matches.
    UpToDate,
    /// Stored schema did not match and was destroyed. All rows were lost.
    Rebuilt { from_version: i64 },
}

/// Returns the latest schema version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Brings the connection to the latest schema version.
///
/// A fresh database gets the schema created. A database stamped with any
/// other version (older or newer), or an unversioned database that already
/// holds tables, is wiped and recreated.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<SchemaOutcome> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    if current_version == i64::from(latest) {
        return Ok(SchemaOutcome::UpToDate);
    }

    let tx = conn.transaction()?;
    let existing_tables = user_tables(&tx)?;
    let outcome = if current_version == 0 && existing_tables.is_empty() {
        SchemaOutcome::Created
    } else {
        for table in &existing_tables {
            tx.execute_batch(&format!("DROP TABLE IF EXISTS \"{table}\";"))?;
        }
        SchemaOutcome::Rebuilt {
            from_version: current_version,
        }
    };

    for migration in MIGRATIONS {
        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
    }
    tx.commit()?;

    match outcome {
        SchemaOutcome::Rebuilt { from_version } => warn!(
            "event=schema_rebuild module=db status=ok from_version={} to_version={} dropped_tables={}",
            from_version,
            latest,
            existing_tables.len()
        ),
        _ => info!(
            "event=schema_create module=db status=ok to_version={}",
            latest
        ),
    }

    Ok(outcome)
}

/// Reads `PRAGMA user_version` from the connection.
///
/// SQLite stores it as a signed 32-bit value, so foreign files may carry a
/// negative version.
pub fn current_user_version(conn: &Connection) -> DbResult<i64> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, i64>(0))?;
    Ok(version)
}

fn user_tables(tx: &Transaction<'_>) -> DbResult<Vec<String>> {
    let mut stmt = tx.prepare(
        "SELECT name
         FROM sqlite_master
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
         ORDER BY name;",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}
