//! SQLite storage bootstrap, schema management and the shared database handle.
//!
//! # Responsibility
//! - Open and configure SQLite connections for inventory core.
//! - Bring the schema to the current version, rebuilding destructively on
//!   mismatch.
//! - Own the process-wide database singleton and its change tracker.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - Core code must not read/write items before the schema is in place.

pub mod database;
pub mod invalidation;
pub mod migrations;
mod open;

pub use database::InventoryDatabase;
pub use invalidation::InvalidationTracker;
pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Storage-level failure.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("failed to prepare database location: {0}")]
    Io(#[from] std::io::Error),
    #[error("database connection lock poisoned")]
    LockPoisoned,
    #[error("background database worker failed: {0}")]
    Worker(String),
}
