use inventory_core::{DatabaseConfig, InventoryDatabase};
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn racing_first_callers_converge_on_one_handle() {
    let dir = tempfile::tempdir().unwrap();
    let config = DatabaseConfig::in_dir(dir.path().join("nested").join("data"));
    assert!(!InventoryDatabase::is_initialized());

    let barrier = Arc::new(Barrier::new(8));
    let callers: Vec<_> = (0..8)
        .map(|_| {
            let config = config.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                InventoryDatabase::get_database(&config).unwrap()
            })
        })
        .collect();
    let handles: Vec<&'static InventoryDatabase> = callers
        .into_iter()
        .map(|caller| caller.join().unwrap())
        .collect();

    let first = handles[0];
    assert!(handles.iter().all(|handle| std::ptr::eq(*handle, first)));
    assert!(InventoryDatabase::is_initialized());
    assert_eq!(first.path(), Some(config.path().as_path()));
    assert!(config.path().exists());

    let elsewhere = DatabaseConfig::in_dir(dir.path().join("elsewhere"));
    let later = InventoryDatabase::get_database(&elsewhere).unwrap();
    assert!(std::ptr::eq(later, first));
    assert!(!elsewhere.data_dir.exists());
}
