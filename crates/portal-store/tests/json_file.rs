//! JSON-file persistence of the memory store

use chrono::{TimeZone, Utc};
use portal_model::{Project, Screen, Task, TaskChange, TaskStatus};
use portal_store::{load_tree, MemoryStore, PortalStore, StoreError};

#[tokio::test]
async fn rows_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("portal.json");
    let now = Utc.with_ymd_and_hms(2026, 3, 3, 12, 0, 0).unwrap();

    let project = Project::new("Harbor", "Marina booking", now);
    let screen = Screen::new(project.id, "Berths", 0, now);
    let task = Task::new(screen.id, "Berth map", 0, now);
    {
        let store = MemoryStore::open(&path).await.unwrap();
        store.insert_project(&project).await.unwrap();
        store.insert_screen(&screen).await.unwrap();
        store.insert_task(&task).await.unwrap();
        store.set_task_status(task.id, TaskStatus::InProgress, now).await.unwrap();
    }

    let reopened = MemoryStore::open(&path).await.unwrap();
    let tree = load_tree(&reopened, project.id).await.unwrap();

    assert_eq!(reopened.project(project.id).await.unwrap().name, "Harbor");
    assert_eq!(tree.screens.len(), 1);
    assert_eq!(tree.tasks[0].status, TaskStatus::InProgress);
    let edits = reopened.task_edits(&[task.id], now - chrono::Duration::hours(1)).await.unwrap();
    assert_eq!(edits[0].change, TaskChange::Status(TaskStatus::InProgress));
}

#[tokio::test]
async fn missing_file_starts_empty_and_is_created_on_write() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fresh.json");

    let store = MemoryStore::open(&path).await.unwrap();
    assert!(store.projects().await.unwrap().is_empty());
    assert!(!path.exists());

    store
        .insert_project(&Project::new("Fresh", "New", Utc::now()))
        .await
        .unwrap();
    assert!(path.exists());
    assert_eq!(store.path(), Some(path.as_path()));
}

#[tokio::test]
async fn corrupt_file_is_a_serialization_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, b"{ not json").unwrap();

    let err = MemoryStore::open(&path).await.unwrap_err();
    assert!(matches!(err, StoreError::Serialization(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writes_all_reach_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("busy.json");
    let now = Utc.with_ymd_and_hms(2026, 3, 3, 12, 0, 0).unwrap();

    let store = std::sync::Arc::new(MemoryStore::open(&path).await.unwrap());
    let project = Project::new("Harbor", "Marina booking", now);
    let screen = Screen::new(project.id, "Berths", 0, now);
    store.insert_project(&project).await.unwrap();
    store.insert_screen(&screen).await.unwrap();

    let handles: Vec<_> = (0..16u32)
        .map(|i| {
            let store = store.clone();
            let task = Task::new(screen.id, format!("Berth {i}"), i, now);
            tokio::spawn(async move { store.insert_task(&task).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let reopened = MemoryStore::open(&path).await.unwrap();
    let tree = load_tree(&reopened, project.id).await.unwrap();
    assert_eq!(tree.tasks.len(), 16);
    assert!(!path.with_extension("json.tmp").exists());
}
