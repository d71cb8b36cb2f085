//! Table change tracking for observable queries.
//!
//! # Responsibility
//! - Publish a monotonically increasing version after every committed write
//!   that changed at least one `item` row.
//! - Hand out receivers that live queries await between re-runs.
//!
//! # Invariants
//! - Writes that affect zero rows never bump the version.
//! - Receivers observe "something changed since you last looked", not a
//!   per-write event; bursts of writes may coalesce into one wake-up.

use log::trace;
use tokio::sync::watch;

/// Change counter for the `item` table.
#[derive(Debug)]
pub struct InvalidationTracker {
    version: watch::Sender<u64>,
}

impl Default for InvalidationTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl InvalidationTracker {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0);
        Self { version }
    }

    /// Marks the table as changed and wakes every subscriber.
    pub fn notify(&self) {
        self.version.send_modify(|version| *version += 1);
        trace!(
            "event=table_invalidated module=db table=item version={}",
            *self.version.borrow()
        );
    }

    /// Returns a receiver that resolves `changed()` after the next `notify`.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    /// Current version; increases by one per effective write.
    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }
}
