//! Recovery and checkpoint behaviour of the write-ahead-logged store.
//! Run with: cargo test --test durable_store_tests

use std::fs::OpenOptions;
use std::io::Write;

use employee_api::Employee;
use employee_api::storage::persistence::{SNAPSHOT_FILE_NAME, WAL_FILE_NAME};
use employee_api::storage::{DurabilityMode, DurableEmployeeStore, EmployeeStore};
use tempfile::TempDir;

#[tokio::test]
async fn test_state_survives_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let store = DurableEmployeeStore::open(dir.path(), DurabilityMode::Sync).unwrap();
        store.create(Employee::new(1, "John", "Meliora")).await.unwrap();
        store.create(Employee::new(2, "Jane", "Meliora")).await.unwrap();
        store.update(Employee::new(5, "X", "Y"), 7).await.unwrap();
        store.delete(2).await.unwrap();
    }

    let store = DurableEmployeeStore::open(dir.path(), DurabilityMode::Sync).unwrap();
    assert_eq!(
        store.read(1).await.unwrap(),
        Some(Employee::new(1, "John", "Meliora"))
    );
    assert_eq!(store.read(2).await.unwrap(), None);
    assert_eq!(store.read(7).await.unwrap(), Some(Employee::new(5, "X", "Y")));
    assert_eq!(store.read_all().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_generated_ids_are_not_reused_after_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let store = DurableEmployeeStore::open(dir.path(), DurabilityMode::Sync).unwrap();
        let first = store
            .create(Employee::unkeyed("Ada", "Analytical"))
            .await
            .unwrap();
        assert_eq!(first.id, Some(1));
        store.delete(1).await.unwrap();
    }

    let store = DurableEmployeeStore::open(dir.path(), DurabilityMode::Sync).unwrap();
    let second = store
        .create(Employee::unkeyed("Grace", "Navy"))
        .await
        .unwrap();
    assert_eq!(second.id, Some(2));
}

#[tokio::test]
async fn test_threshold_triggers_checkpoint() {
    let dir = TempDir::new().unwrap();
    let store =
        DurableEmployeeStore::open_with_threshold(dir.path(), DurabilityMode::Sync, 3).unwrap();

    for id in 1..=3 {
        store
            .create(Employee::new(id, format!("E{id}"), "Acme"))
            .await
            .unwrap();
    }

    assert!(dir.path().join(SNAPSHOT_FILE_NAME).exists());
    let wal_len = std::fs::metadata(dir.path().join(WAL_FILE_NAME)).unwrap().len();
    assert_eq!(wal_len, 0);

    store.create(Employee::new(4, "E4", "Acme")).await.unwrap();
    drop(store);

    let store = DurableEmployeeStore::open(dir.path(), DurabilityMode::Sync).unwrap();
    assert_eq!(store.read_all().await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_explicit_checkpoint_then_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let store = DurableEmployeeStore::open(dir.path(), DurabilityMode::Async).unwrap();
        store.create(Employee::new(1, "John", "Meliora")).await.unwrap();
        store.checkpoint().await.unwrap();
        store.create(Employee::new(2, "Jane", "Meliora")).await.unwrap();
    }

    let store = DurableEmployeeStore::open(dir.path(), DurabilityMode::Async).unwrap();
    assert!(store.read(1).await.unwrap().is_some());
    assert!(store.read(2).await.unwrap().is_some());
}

#[tokio::test]
async fn test_torn_tail_recovers_complete_entries() {
    let dir = TempDir::new().unwrap();
    {
        let store = DurableEmployeeStore::open(dir.path(), DurabilityMode::Sync).unwrap();
        store.create(Employee::new(1, "John", "Meliora")).await.unwrap();
    }

    let mut wal = OpenOptions::new()
        .append(true)
        .open(dir.path().join(WAL_FILE_NAME))
        .unwrap();
    wal.write_all(&128u32.to_le_bytes()).unwrap();
    wal.write_all(&[0x93]).unwrap();
    drop(wal);

    let store = DurableEmployeeStore::open(dir.path(), DurabilityMode::Sync).unwrap();
    assert!(store.read(1).await.unwrap().is_some());

    // The log was compacted on open, so new appends land on a clean file.
    store.create(Employee::new(2, "Jane", "Meliora")).await.unwrap();
    drop(store);
    let store = DurableEmployeeStore::open(dir.path(), DurabilityMode::Sync).unwrap();
    assert_eq!(store.read_all().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_corrupted_wal_fails_open() {
    let dir = TempDir::new().unwrap();
    let mut bytes = 2u32.to_le_bytes().to_vec();
    bytes.extend_from_slice(&[0xc1, 0xc1]);
    std::fs::write(dir.path().join(WAL_FILE_NAME), bytes).unwrap();

    let result = DurableEmployeeStore::open(dir.path(), DurabilityMode::Sync);
    assert!(matches!(result, Err(employee_api::StoreError::Corrupted(_))));
}

#[tokio::test]
async fn test_none_mode_does_not_persist() {
    let dir = TempDir::new().unwrap();
    {
        let store = DurableEmployeeStore::open(dir.path(), DurabilityMode::None).unwrap();
        store.create(Employee::new(1, "John", "Meliora")).await.unwrap();
        assert!(store.read(1).await.unwrap().is_some());
    }

    let store = DurableEmployeeStore::open(dir.path(), DurabilityMode::None).unwrap();
    assert_eq!(store.read(1).await.unwrap(), None);
}

#[tokio::test]
async fn test_delete_of_missing_key_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let store = DurableEmployeeStore::open(dir.path(), DurabilityMode::Sync).unwrap();
    store.delete(42).await.unwrap();
    store.delete(42).await.unwrap();

    let wal_len = std::fs::metadata(dir.path().join(WAL_FILE_NAME)).unwrap().len();
    assert_eq!(wal_len, 0);
}

#[tokio::test]
async fn test_failed_checkpoint_keeps_store_writable() {
    let dir = TempDir::new().unwrap();
    let snapshot_path = dir.path().join(SNAPSHOT_FILE_NAME);
    {
        let store =
            DurableEmployeeStore::open_with_threshold(dir.path(), DurabilityMode::Sync, 1).unwrap();
        // Snapshot rename fails while a directory occupies its path.
        std::fs::create_dir(&snapshot_path).unwrap();
        store.create(Employee::new(1, "John", "Meliora")).await.unwrap();
        store.create(Employee::new(2, "Jane", "Meliora")).await.unwrap();
        assert!(store.checkpoint().await.is_err());
        store.create(Employee::new(3, "Jim", "Meliora")).await.unwrap();
    }
    std::fs::remove_dir(&snapshot_path).unwrap();

    let store = DurableEmployeeStore::open(dir.path(), DurabilityMode::Sync).unwrap();
    assert_eq!(store.read_all().await.unwrap().len(), 3);
}
