use futures::{Stream, StreamExt};
use inventory_core::{InventoryDatabase, Item, ItemStore, RepoResult};
use rusqlite::Connection;
use std::time::Duration;
use tokio::time::timeout;

const EMIT_TIMEOUT: Duration = Duration::from_secs(5);
const QUIET_PERIOD: Duration = Duration::from_millis(150);

async fn next_value<T, S>(stream: &mut S) -> T
where
    S: Stream<Item = RepoResult<T>> + Unpin,
{
    timeout(EMIT_TIMEOUT, stream.next())
        .await
        .expect("stream did not emit in time")
        .expect("stream ended")
        .expect("query failed")
}

async fn assert_quiet<S: Stream + Unpin>(stream: &mut S) {
    assert!(
        timeout(QUIET_PERIOD, stream.next()).await.is_err(),
        "stream emitted unexpectedly"
    );
}

fn names(items: &[Item]) -> Vec<&str> {
    items.iter().map(|item| item.name.as_str()).collect()
}

#[tokio::test]
async fn get_items_emits_current_state_then_each_write() {
    let database = InventoryDatabase::open_in_memory().unwrap();
    let store = database.item_store();
    let mut items = store.get_items();

    assert!(next_value(&mut items).await.is_empty());

    let id = store.insert(Item::new("Widget", 9.99, 10)).await.unwrap().unwrap();
    let snapshot = next_value(&mut items).await;
    assert_eq!(snapshot, vec![Item::with_id(id, "Widget", 9.99, 10)]);

    store.delete(snapshot[0].clone()).await.unwrap();
    assert!(next_value(&mut items).await.is_empty());
}

#[tokio::test]
async fn get_items_is_sorted_by_name() {
    let database = InventoryDatabase::open_in_memory().unwrap();
    let store = database.item_store();

    store.insert(Item::new("Banana", 0.5, 3)).await.unwrap();
    store.insert(Item::new("Apple", 0.4, 5)).await.unwrap();

    let mut items = store.get_items();
    assert_eq!(names(&next_value(&mut items).await), ["Apple", "Banana"]);

    store.insert(Item::new("Aardvark plush", 12.0, 1)).await.unwrap();
    assert_eq!(
        names(&next_value(&mut items).await),
        ["Aardvark plush", "Apple", "Banana"]
    );
}

#[tokio::test]
async fn writes_that_change_nothing_do_not_notify() {
    let database = InventoryDatabase::open_in_memory().unwrap();
    let store = database.item_store();
    let id = store.insert(Item::new("Solo", 1.0, 1)).await.unwrap().unwrap();

    let mut items = store.get_items();
    assert_eq!(next_value(&mut items).await.len(), 1);
    let version = database.change_version();

    let conflict = store.insert(Item::with_id(id, "Clash", 2.0, 2)).await.unwrap();
    let updated = store.update(Item::with_id(404, "Nobody", 0.0, 0)).await.unwrap();
    let deleted = store.delete(Item::with_id(404, "Nobody", 0.0, 0)).await.unwrap();

    assert_eq!(conflict, None);
    assert!(!updated);
    assert!(!deleted);
    assert_eq!(database.change_version(), version);
    assert_quiet(&mut items).await;
}

#[tokio::test]
async fn get_item_stays_pending_until_row_appears() {
    let database = InventoryDatabase::open_in_memory().unwrap();
    let store = database.item_store();
    let mut watched = store.get_item(1);

    assert_quiet(&mut watched).await;

    store.insert(Item::new("Late arrival", 3.0, 2)).await.unwrap();
    assert_eq!(
        next_value(&mut watched).await,
        Item::with_id(1, "Late arrival", 3.0, 2)
    );
}

#[tokio::test]
async fn get_item_emits_only_when_its_row_changes() {
    let database = InventoryDatabase::open_in_memory().unwrap();
    let store = database.item_store();
    let a = store.insert(Item::new("A", 1.0, 1)).await.unwrap().unwrap();
    let b = store.insert(Item::new("B", 2.0, 2)).await.unwrap().unwrap();

    let mut watched = store.get_item(a);
    assert_eq!(next_value(&mut watched).await.name, "A");

    store.update(Item::with_id(b, "B2", 2.0, 2)).await.unwrap();
    assert_quiet(&mut watched).await;

    store.update(Item::with_id(a, "A2", 1.0, 7)).await.unwrap();
    assert_eq!(
        next_value(&mut watched).await,
        Item::with_id(a, "A2", 1.0, 7)
    );
}

#[tokio::test]
async fn get_item_goes_quiet_after_delete() {
    let database = InventoryDatabase::open_in_memory().unwrap();
    let store = database.item_store();
    let id = store.insert(Item::new("Doomed", 1.0, 1)).await.unwrap().unwrap();

    let mut watched = store.get_item(id);
    let item = next_value(&mut watched).await;

    store.delete(item).await.unwrap();
    assert_quiet(&mut watched).await;
}

#[tokio::test]
async fn write_finishing_after_caller_dropped_still_reaches_observers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inventory.sqlite3");
    let database = InventoryDatabase::open(&path).unwrap();
    let store = database.item_store();
    let mut items = store.get_items();
    assert!(next_value(&mut items).await.is_empty());

    let blocker = Connection::open(&path).unwrap();
    blocker.execute_batch("BEGIN EXCLUSIVE;").unwrap();

    // Starts the blocking INSERT, which now waits on the file lock.
    let mut insert = Box::pin(store.insert(Item::new("Late", 1.0, 1)));
    assert!(futures::poll!(&mut insert).is_pending());
    drop(insert);

    tokio::time::sleep(Duration::from_millis(50)).await;
    blocker.execute_batch("COMMIT;").unwrap();

    assert_eq!(names(&next_value(&mut items).await), ["Late"]);
    assert_eq!(database.change_version(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_writers_all_land() {
    let database = InventoryDatabase::open_in_memory().unwrap();
    let store = database.item_store();

    let writers = (0..8).map(|n| {
        let store = store.clone();
        tokio::spawn(async move { store.insert(Item::new(format!("item-{n}"), 1.0, n)).await })
    });
    for writer in writers.collect::<Vec<_>>() {
        writer.await.unwrap().unwrap();
    }

    let mut items = store.get_items();
    assert_eq!(next_value(&mut items).await.len(), 8);
}
