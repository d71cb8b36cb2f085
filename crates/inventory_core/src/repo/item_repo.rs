//! Item repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide synchronous CRUD over the `item` table on one connection.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Inserts ignore primary-key conflicts instead of failing.
//! - Update/delete of a missing id is a no-op reported as `false`.
//! - Listing order is `name ASC`, ties broken by `id ASC`.

use crate::db::migrations::{current_user_version, SCHEMA_VERSION};
use crate::db::DbError;
use crate::model::item::{Item, ItemId};
use rusqlite::{params, Connection, OptionalExtension, Row};

const ITEM_SELECT_SQL: &str = "SELECT
    id,
    name,
    price,
    quantity
FROM item";

const REQUIRED_ITEM_COLUMNS: &[&str] = &["id", "name", "price", "quantity"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for item persistence and query operations.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(
        "connection schema version {actual_version} does not match expected {expected_version}"
    )]
    UninitializedConnection {
        expected_version: u32,
        actual_version: i64,
    },
    #[error("required table `{0}` is missing")]
    MissingRequiredTable(&'static str),
    #[error("required column `{table}.{column}` is missing")]
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for item CRUD operations.
pub trait ItemRepository {
    /// Inserts a row; returns the assigned id, or `None` on id conflict.
    fn insert_item(&self, item: &Item) -> RepoResult<Option<ItemId>>;
    /// Overwrites the row matching `item.id`; `false` when none matched.
    fn update_item(&self, item: &Item) -> RepoResult<bool>;
    /// Deletes the row matching `item.id`; `false` when none matched.
    fn delete_item(&self, item: &Item) -> RepoResult<bool>;
    fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>>;
    /// All rows ordered by name.
    fn list_items(&self) -> RepoResult<Vec<Item>>;
}

/// SQLite-backed item repository.
pub struct SqliteItemRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteItemRepository<'conn> {
    /// Constructs a repository from a connection prepared by `open_db*`.
    ///
    /// Rejects connections that were never bootstrapped or whose `item`
    /// table does not have the expected shape.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    /// Wraps a connection already verified by `open_db*`.
    pub(crate) fn from_ready(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ItemRepository for SqliteItemRepository<'_> {
    fn insert_item(&self, item: &Item) -> RepoResult<Option<ItemId>> {
        // NULL lets SQLite assign the next id.
        let id = item.has_assigned_id().then_some(item.id);
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO item (id, name, price, quantity)
             VALUES (?1, ?2, ?3, ?4);",
            params![id, item.name.as_str(), item.price, item.quantity_in_stock],
        )?;

        if changed == 0 {
            return Ok(None);
        }

        Ok(Some(self.conn.last_insert_rowid()))
    }

    fn update_item(&self, item: &Item) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE item
             SET
                name = ?1,
                price = ?2,
                quantity = ?3
             WHERE id = ?4;",
            params![
                item.name.as_str(),
                item.price,
                item.quantity_in_stock,
                item.id
            ],
        )?;

        Ok(changed > 0)
    }

    fn delete_item(&self, item: &Item) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM item WHERE id = ?1;", [item.id])?;
        Ok(changed > 0)
    }

    fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{ITEM_SELECT_SQL} WHERE id = ?1;"))?;
        let item = stmt.query_row([id], parse_item_row).optional()?;
        Ok(item)
    }

    fn list_items(&self) -> RepoResult<Vec<Item>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{ITEM_SELECT_SQL} ORDER BY name ASC, id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();

        while let Some(row) = rows.next()? {
            items.push(parse_item_row(row)?);
        }

        Ok(items)
    }
}

fn parse_item_row(row: &Row<'_>) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get("id")?,
        name: row.get("name")?,
        price: row.get("price")?,
        quantity_in_stock: row.get("quantity")?,
    })
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let actual_version = current_user_version(conn)?;
    if actual_version != i64::from(SCHEMA_VERSION) {
        return Err(RepoError::UninitializedConnection {
            expected_version: SCHEMA_VERSION,
            actual_version,
        });
    }

    let table_exists: bool = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'item'
        );",
        [],
        |row| row.get(0),
    )?;
    if !table_exists {
        return Err(RepoError::MissingRequiredTable("item"));
    }

    let mut stmt = conn.prepare("PRAGMA table_info(item);")?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>("name"))?
        .collect::<Result<Vec<_>, _>>()?;
    for &required in REQUIRED_ITEM_COLUMNS {
        if !columns.iter().any(|column| column.as_str() == required) {
            return Err(RepoError::MissingRequiredColumn {
                table: "item",
                column: required,
            });
        }
    }

    Ok(())
}
