//! Item domain model.
//!
//! # Responsibility
//! - Define the canonical record for one stock-keeping unit.
//! - Provide derived read-only views (stock availability, formatted price).
//!
//! # Invariants
//! - `id == UNASSIGNED_ITEM_ID` means the store has not assigned identity yet.
//! - Identity is immutable once assigned by the store.
//! - No validation happens here; input checks belong to the controller.

use crate::model::currency::CurrencyFormat;
use serde::{Deserialize, Serialize};

/// Integer identity assigned by the store on first insert.
pub type ItemId = i64;

/// Sentinel identity for items that were never persisted.
pub const UNASSIGNED_ITEM_ID: ItemId = 0;

/// One inventory line: name, unit price and units on hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Store-assigned identity; `0` until the first insert.
    #[serde(default)]
    pub id: ItemId,
    /// Display name. Uniqueness is not enforced.
    pub name: String,
    /// Unit price as a double; not currency-safe.
    pub price: f64,
    /// Units on hand. Selling never takes this below zero.
    #[serde(rename = "quantity")]
    pub quantity_in_stock: i32,
}

impl Item {
    /// Creates an item without identity; the store assigns one on insert.
    pub fn new(name: impl Into<String>, price: f64, quantity_in_stock: i32) -> Self {
        Self::with_id(UNASSIGNED_ITEM_ID, name, price, quantity_in_stock)
    }

    /// Creates an item carrying a caller-provided identity.
    ///
    /// Used by update paths where the row already exists.
    pub fn with_id(
        id: ItemId,
        name: impl Into<String>,
        price: f64,
        quantity_in_stock: i32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            quantity_in_stock,
        }
    }

    /// Returns a copy with `quantity_in_stock` replaced.
    pub fn with_quantity(&self, quantity_in_stock: i32) -> Self {
        Self {
            quantity_in_stock,
            ..self.clone()
        }
    }

    /// Returns whether the store has assigned identity to this item.
    pub fn has_assigned_id(&self) -> bool {
        self.id != UNASSIGNED_ITEM_ID
    }

    /// Returns whether at least one unit can be sold.
    pub fn is_in_stock(&self) -> bool {
        self.quantity_in_stock > 0
    }

    /// Renders `price` with the default currency format.
    pub fn formatted_price(&self) -> String {
        self.formatted_price_with(&CurrencyFormat::default())
    }

    /// Renders `price` with an explicit currency format.
    pub fn formatted_price_with(&self, format: &CurrencyFormat) -> String {
        format.format(self.price)
    }
}
