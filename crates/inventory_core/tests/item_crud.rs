use inventory_core::db::migrations::latest_version;
use inventory_core::db::open_db_in_memory;
use inventory_core::{Item, ItemRepository, RepoError, SqliteItemRepository};
use rusqlite::Connection;

#[test]
fn insert_assigns_identity_and_get_roundtrips() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::try_new(&conn).unwrap();

    let id = repo
        .insert_item(&Item::new("Widget", 9.99, 10))
        .unwrap()
        .unwrap();
    assert!(id >= 1);

    let loaded = repo.get_item(id).unwrap().unwrap();
    assert_eq!(loaded, Item::with_id(id, "Widget", 9.99, 10));
}

#[test]
fn insert_with_existing_id_is_ignored() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::try_new(&conn).unwrap();

    let id = repo
        .insert_item(&Item::new("Original", 1.0, 1))
        .unwrap()
        .unwrap();
    let conflict = repo
        .insert_item(&Item::with_id(id, "Impostor", 2.0, 2))
        .unwrap();

    assert_eq!(conflict, None);
    assert_eq!(repo.get_item(id).unwrap().unwrap().name, "Original");
    assert_eq!(repo.list_items().unwrap().len(), 1);
}

#[test]
fn insert_with_fresh_explicit_id_keeps_it() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::try_new(&conn).unwrap();

    let id = repo
        .insert_item(&Item::with_id(42, "Pinned", 3.0, 3))
        .unwrap();
    assert_eq!(id, Some(42));
}

#[test]
fn update_overwrites_every_field() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::try_new(&conn).unwrap();

    let id = repo
        .insert_item(&Item::new("Draft", 1.0, 1))
        .unwrap()
        .unwrap();
    let changed = repo
        .update_item(&Item::with_id(id, "Final", 4.5, 8))
        .unwrap();

    assert!(changed);
    assert_eq!(
        repo.get_item(id).unwrap().unwrap(),
        Item::with_id(id, "Final", 4.5, 8)
    );
}

#[test]
fn update_of_unknown_id_changes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::try_new(&conn).unwrap();
    repo.insert_item(&Item::new("Kept", 1.0, 1)).unwrap();

    let changed = repo
        .update_item(&Item::with_id(9_999, "Ghost", 0.0, 0))
        .unwrap();

    assert!(!changed);
    let items = repo.list_items().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "Kept");
}

#[test]
fn delete_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::try_new(&conn).unwrap();

    let id = repo
        .insert_item(&Item::new("Gone", 1.0, 1))
        .unwrap()
        .unwrap();
    let item = repo.get_item(id).unwrap().unwrap();

    assert!(repo.delete_item(&item).unwrap());
    assert!(!repo.delete_item(&item).unwrap());
    assert!(!repo
        .delete_item(&Item::with_id(12_345, "Unknown", 0.0, 0))
        .unwrap());
    assert!(repo.get_item(id).unwrap().is_none());
}

#[test]
fn list_orders_by_name_regardless_of_insertion_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::try_new(&conn).unwrap();

    for name in ["Cherry", "Banana", "Apple", "Banana"] {
        repo.insert_item(&Item::new(name, 1.0, 1)).unwrap();
    }

    let items = repo.list_items().unwrap();
    let names: Vec<_> = items.iter().map(|item| item.name.as_str()).collect();
    assert_eq!(names, ["Apple", "Banana", "Banana", "Cherry"]);
    assert!(items[1].id < items[2].id);
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let result = SqliteItemRepository::try_new(&conn);
    match result {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_item_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteItemRepository::try_new(&conn);
    assert!(matches!(result, Err(RepoError::MissingRequiredTable("item"))));
}

#[test]
fn repository_rejects_item_table_missing_quantity() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE item (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            price REAL NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteItemRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "item",
            column: "quantity"
        })
    ));
}
