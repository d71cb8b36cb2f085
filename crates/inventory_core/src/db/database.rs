//! Process-wide database handle.
//!
//! # Responsibility
//! - Construct the inventory database exactly once per process, lazily.
//! - Share one connection and one change tracker between every store.
//!
//! # Invariants
//! - The singleton is either uninitialized or ready; racing first callers
//!   converge on a single construction.
//! - A failed construction leaves the singleton uninitialized.
//! - There is no teardown; the ready handle lives for the whole process.

use crate::config::DatabaseConfig;
use crate::db::invalidation::InvalidationTracker;
use crate::db::{open_db, open_db_in_memory, DbError, DbResult};
use crate::store::item_store::SqliteItemStore;
use log::{debug, info};
use once_cell::sync::OnceCell;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

static INSTANCE: OnceCell<InventoryDatabase> = OnceCell::new();

/// Shared state behind every handle and store clone.
#[derive(Debug)]
pub(crate) struct DatabaseInner {
    conn: Mutex<Connection>,
    pub(crate) tracker: InvalidationTracker,
    path: Option<PathBuf>,
}

impl DatabaseInner {
    pub(crate) fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::LockPoisoned)
    }
}

/// Handle to an opened inventory database.
///
/// Cloning is cheap; clones share the connection and change tracker.
#[derive(Debug, Clone)]
pub struct InventoryDatabase {
    inner: Arc<DatabaseInner>,
}

impl InventoryDatabase {
    /// Returns the process-wide database, constructing it on first use.
    ///
    /// Only the first successful call reads `config`; later calls return the
    /// ready handle regardless of the configuration they pass. Construction
    /// opens `<data_dir>/<name>` and rebuilds the store destructively when
    /// the stored schema version does not match.
    ///
    /// Construction does blocking file I/O on the calling thread.
    pub fn get_database(config: &DatabaseConfig) -> DbResult<&'static InventoryDatabase> {
        if let Some(database) = INSTANCE.get() {
            return Ok(database);
        }

        INSTANCE.get_or_try_init(|| {
            std::fs::create_dir_all(&config.data_dir)?;
            let database = Self::open(config.path())?;
            info!(
                "event=database_singleton_init module=db status=ok path={}",
                config.path().display()
            );
            Ok(database)
        })
    }

    /// Returns whether the process-wide database has been constructed.
    pub fn is_initialized() -> bool {
        INSTANCE.get().is_some()
    }

    /// Opens a standalone (non-singleton) handle to a database file.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = open_db(&path)?;
        Ok(Self::from_connection(conn, Some(path)))
    }

    /// Opens a standalone in-memory database.
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = open_db_in_memory()?;
        Ok(Self::from_connection(conn, None))
    }

    fn from_connection(conn: Connection, path: Option<PathBuf>) -> Self {
        debug!(
            "event=database_handle module=db status=ok in_memory={}",
            path.is_none()
        );
        Self {
            inner: Arc::new(DatabaseInner {
                conn: Mutex::new(conn),
                tracker: InvalidationTracker::new(),
                path,
            }),
        }
    }

    /// Returns the item store bound to this database.
    pub fn item_store(&self) -> SqliteItemStore {
        SqliteItemStore::new(Arc::clone(&self.inner))
    }

    /// Backing file, or `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.inner.path.as_deref()
    }

    /// Current change version of the `item` table.
    pub fn change_version(&self) -> u64 {
        self.inner.tracker.version()
    }
}
