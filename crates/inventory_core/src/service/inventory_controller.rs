//! Inventory use-case controller for presentation callers.
//!
//! # Responsibility
//! - Turn raw form input into `Item` values and submit them to the store.
//! - Expose the store's live queries unchanged.
//! - Own the scope that cancels pending submissions on teardown.
//!
//! # Invariants
//! - Mutations are fire-and-forget; callers observe results via streams.
//! - Selling never takes `quantity_in_stock` below zero.
//! - Only blankness is validated; numeric parse failures go back to the
//!   caller of `add_new_item`/`update_item`.

use crate::db::database::InventoryDatabase;
use crate::model::item::{Item, ItemId};
use crate::repo::item_repo::RepoResult;
use crate::service::scope::TaskScope;
use crate::store::item_store::{ItemStore, ItemStream, ItemsStream, SqliteItemStore};
use log::{error, info};
use std::future::Future;
use std::num::{ParseFloatError, ParseIntError};
use std::sync::Arc;

/// Raw-input conversion failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntryError {
    #[error("invalid price `{input}`: {source}")]
    InvalidPrice {
        input: String,
        #[source]
        source: ParseFloatError,
    },
    #[error("invalid quantity `{input}`: {source}")]
    InvalidQuantity {
        input: String,
        #[source]
        source: ParseIntError,
    },
}

/// Mediator between presentation input and the item store.
pub struct InventoryController<S: ItemStore> {
    store: Arc<S>,
    scope: TaskScope,
}

impl InventoryController<SqliteItemStore> {
    /// Creates a controller over the given database's item store.
    pub fn from_database(database: &InventoryDatabase) -> Self {
        Self::new(database.item_store())
    }
}

impl<S: ItemStore> InventoryController<S> {
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
            scope: TaskScope::new("inventory_controller"),
        }
    }

    /// Every item ordered by name, kept current with the store.
    pub fn all_items(&self) -> ItemsStream {
        self.store.get_items()
    }

    /// Returns `false` when any input is empty or whitespace-only.
    ///
    /// Numeric format is not checked.
    pub fn validate_entry(&self, name: &str, price: &str, quantity: &str) -> bool {
        !(is_blank(name) || is_blank(price) || is_blank(quantity))
    }

    /// Builds a new item from raw input and submits it for insertion.
    pub fn add_new_item(&self, name: &str, price: &str, quantity: &str) -> Result<(), EntryError> {
        let (price, quantity) = parse_amounts(price, quantity)?;
        self.insert_item(Item::new(name, price, quantity));
        Ok(())
    }

    /// Live view of one item; pending while the id is absent.
    pub fn retrieve_item(&self, id: ItemId) -> ItemStream {
        self.store.get_item(id)
    }

    /// Builds an item carrying `id` from raw input and submits an update.
    pub fn update_item(
        &self,
        id: ItemId,
        name: &str,
        price: &str,
        quantity: &str,
    ) -> Result<(), EntryError> {
        let (price, quantity) = parse_amounts(price, quantity)?;
        self.submit_update(Item::with_id(id, name, price, quantity));
        Ok(())
    }

    /// Submits a copy with one unit fewer; does nothing when out of stock.
    pub fn sell_item(&self, item: &Item) {
        if !self.is_stock_available(item) {
            return;
        }
        self.submit_update(item.with_quantity(item.quantity_in_stock - 1));
    }

    /// Whether a sell action should be offered for `item`.
    pub fn is_stock_available(&self, item: &Item) -> bool {
        item.is_in_stock()
    }

    pub fn delete_item(&self, item: &Item) {
        let store = Arc::clone(&self.store);
        let item = item.clone();
        self.submit("item_delete", async move { store.delete(item).await.map(drop) });
    }

    /// Cancels pending submissions. Later mutations are dropped.
    pub fn clear(&self) {
        if !self.scope.is_cancelled() {
            info!("event=controller_clear module=controller status=ok");
        }
        self.scope.cancel();
    }

    /// Submissions launched but not yet observed as finished.
    pub fn pending_submissions(&self) -> usize {
        self.scope.pending()
    }

    fn insert_item(&self, item: Item) {
        let store = Arc::clone(&self.store);
        self.submit("item_insert", async move { store.insert(item).await.map(drop) });
    }

    fn submit_update(&self, item: Item) {
        let store = Arc::clone(&self.store);
        self.submit("item_update", async move { store.update(item).await.map(drop) });
    }

    fn submit<F>(&self, event: &'static str, operation: F)
    where
        F: Future<Output = RepoResult<()>> + Send + 'static,
    {
        self.scope.launch(event, async move {
            if let Err(err) = operation.await {
                error!("event={event} module=controller status=error error={err}");
            }
        });
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn parse_amounts(price: &str, quantity: &str) -> Result<(f64, i32), EntryError> {
    let parsed_price = price
        .trim()
        .parse::<f64>()
        .map_err(|source| EntryError::InvalidPrice {
            input: price.to_string(),
            source,
        })?;
    let parsed_quantity =
        quantity
            .trim()
            .parse::<i32>()
            .map_err(|source| EntryError::InvalidQuantity {
                input: quantity.to_string(),
                source,
            })?;
    Ok((parsed_price, parsed_quantity))
}
