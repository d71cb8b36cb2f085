//! Async item store with live queries.
//!
//! # Responsibility
//! - Expose item CRUD as futures that never block the caller's thread.
//! - Expose read queries as streams that re-run after every effective write.
//!
//! # Invariants
//! - SQL runs on the blocking pool, serialized by the shared connection lock.
//! - Observers are notified only after a write that changed at least one row,
//!   from the blocking call itself, so a dropped caller cannot swallow it.
//! - A live query emits its current result first, then once per observed
//!   change; bursts of writes may coalesce into one emission.
//!
//! All futures and streams here must be polled inside a Tokio runtime.

use crate::db::database::DatabaseInner;
use crate::db::DbError;
use crate::model::item::{Item, ItemId};
use crate::repo::item_repo::{ItemRepository, RepoError, RepoResult, SqliteItemRepository};
use futures::stream::{self, BoxStream, StreamExt};
use log::{debug, trace};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

/// Live stream of one item.
pub type ItemStream = BoxStream<'static, RepoResult<Item>>;
/// Live stream of every item, ordered by name.
pub type ItemsStream = BoxStream<'static, RepoResult<Vec<Item>>>;

/// Persistence contract consumed by the controller.
pub trait ItemStore: Send + Sync + 'static {
    /// Persists a new item. A conflicting id is ignored and yields `None`.
    fn insert(&self, item: Item) -> impl Future<Output = RepoResult<Option<ItemId>>> + Send;

    /// Overwrites the row with `item.id`. Yields `false` if no row matched.
    fn update(&self, item: Item) -> impl Future<Output = RepoResult<bool>> + Send;

    /// Removes the row with `item.id`. Yields `false` if it was absent.
    fn delete(&self, item: Item) -> impl Future<Output = RepoResult<bool>> + Send;

    /// Live view of one row.
    ///
    /// Emits the row, then again whenever its value changes. Emits nothing
    /// while the row does not exist.
    fn get_item(&self, id: ItemId) -> ItemStream;

    /// Live view of the whole table ordered by name ascending.
    ///
    /// Emits the current collection, then again after every effective write.
    fn get_items(&self) -> ItemsStream;
}

/// `ItemStore` backed by the shared SQLite connection.
#[derive(Debug, Clone)]
pub struct SqliteItemStore {
    db: Arc<DatabaseInner>,
}

impl SqliteItemStore {
    pub(crate) fn new(db: Arc<DatabaseInner>) -> Self {
        Self { db }
    }

    async fn run<T, F>(&self, query: F) -> RepoResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&SqliteItemRepository<'_>) -> RepoResult<T> + Send + 'static,
    {
        self.run_write(query, |_| false).await
    }

    /// Runs `write` and, when `changed` holds for its result, notifies
    /// observers from the same blocking call. The notification is sent even if
    /// the awaiting task has been aborted in the meantime.
    async fn run_write<T, F>(&self, write: F, changed: fn(&T) -> bool) -> RepoResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&SqliteItemRepository<'_>) -> RepoResult<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || -> RepoResult<T> {
            let result = {
                let conn = db.lock()?;
                write(&SqliteItemRepository::from_ready(&conn))?
            };
            if changed(&result) {
                db.tracker.notify();
            }
            Ok(result)
        })
        .await
        .map_err(|err| RepoError::Db(DbError::Worker(err.to_string())))?
    }
}

impl ItemStore for SqliteItemStore {
    fn insert(&self, item: Item) -> impl Future<Output = RepoResult<Option<ItemId>>> + Send {
        let store = self.clone();
        async move {
            let inserted = store
                .run_write(move |repo| repo.insert_item(&item), Option::is_some)
                .await?;
            debug!(
                "event=item_insert module=store status=ok inserted={} id={:?}",
                inserted.is_some(),
                inserted
            );
            Ok(inserted)
        }
    }

    fn update(&self, item: Item) -> impl Future<Output = RepoResult<bool>> + Send {
        let store = self.clone();
        async move {
            let id = item.id;
            let changed = store
                .run_write(move |repo| repo.update_item(&item), |changed| *changed)
                .await?;
            debug!("event=item_update module=store status=ok id={id} changed={changed}");
            Ok(changed)
        }
    }

    fn delete(&self, item: Item) -> impl Future<Output = RepoResult<bool>> + Send {
        let store = self.clone();
        async move {
            let id = item.id;
            let changed = store
                .run_write(move |repo| repo.delete_item(&item), |changed| *changed)
                .await?;
            debug!("event=item_delete module=store status=ok id={id} changed={changed}");
            Ok(changed)
        }
    }

    fn get_item(&self, id: ItemId) -> ItemStream {
        let initial = ItemObserver {
            live: LiveQuery::new(self.clone()),
            last: None,
        };

        stream::unfold(initial, move |mut observer| async move {
            loop {
                if !observer.live.wait_for_change().await {
                    return None;
                }
                match observer.live.store.run(move |repo| repo.get_item(id)).await {
                    Ok(Some(item)) if observer.last.as_ref() != Some(&item) => {
                        trace!("event=item_emit module=store id={id}");
                        observer.last = Some(item.clone());
                        return Some((Ok(item), observer));
                    }
                    // Unchanged row: a write touched some other item.
                    Ok(Some(_)) => {}
                    Ok(None) => observer.last = None,
                    Err(err) => return Some((Err(err), observer)),
                }
            }
        })
        .boxed()
    }

    fn get_items(&self) -> ItemsStream {
        stream::unfold(LiveQuery::new(self.clone()), |mut live| async move {
            if !live.wait_for_change().await {
                return None;
            }
            let result = live.store.run(|repo| repo.list_items()).await;
            if let Ok(items) = &result {
                trace!("event=items_emit module=store count={}", items.len());
            }
            Some((result, live))
        })
        .boxed()
    }
}

/// Re-run trigger shared by live queries.
struct LiveQuery {
    store: SqliteItemStore,
    changes: watch::Receiver<u64>,
    primed: bool,
}

impl LiveQuery {
    fn new(store: SqliteItemStore) -> Self {
        let changes = store.db.tracker.subscribe();
        Self {
            store,
            changes,
            primed: false,
        }
    }

    /// Resolves immediately on first call, then after the next change.
    ///
    /// Returns `false` once the change source is gone.
    async fn wait_for_change(&mut self) -> bool {
        if self.primed && self.changes.changed().await.is_err() {
            return false;
        }
        self.primed = true;
        // Marked before the query runs so a write racing the query still
        // triggers another pass.
        self.changes.borrow_and_update();
        true
    }
}

struct ItemObserver {
    live: LiveQuery,
    last: Option<Item>,
}
