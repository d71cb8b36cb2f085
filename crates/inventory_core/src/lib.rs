//! Core domain logic for inventory tracking.
//! This crate is the single source of truth for item invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use config::{load_config, ConfigError, DatabaseConfig, InventoryConfig, LoggingConfig};
pub use db::{DbError, DbResult, InventoryDatabase};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::currency::{CurrencyFormat, SymbolPosition};
pub use model::item::{Item, ItemId, UNASSIGNED_ITEM_ID};
pub use repo::item_repo::{ItemRepository, RepoError, RepoResult, SqliteItemRepository};
pub use service::inventory_controller::{EntryError, InventoryController};
pub use service::scope::TaskScope;
pub use store::item_store::{ItemStore, ItemStream, ItemsStream, SqliteItemStore};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
