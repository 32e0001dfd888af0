//! Outline import against real and failing stores

use chrono::Utc;
use portal_import::{import_outline, ImportError, MarkdownProjectParser, ParseError};
use portal_model::TaskStatus;
use portal_store::{load_tree, MemoryStore, MockPortalStore, PortalStore, StoreError};

const OUTLINE: &str = "# Pantry
> Never forget the milk
Shared grocery lists.

## Lists
- [ ] Create list
- [ ] Share list

## Settings
- [ ] Invite member
";

#[tokio::test]
async fn new_project_rows_match_outline() {
    let store = MemoryStore::new();
    let parser = MarkdownProjectParser::new();

    let report = import_outline(&store, &parser, OUTLINE, None, Utc::now()).await.unwrap();

    assert!(report.project_created);
    assert_eq!((report.screens_created, report.tasks_created), (2, 3));
    let project = store.project(report.project_id).await.unwrap();
    assert_eq!(project.tagline.as_deref(), Some("Never forget the milk"));
    let tree = load_tree(&store, report.project_id).await.unwrap();
    let titles: Vec<_> = tree.tasks.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["Create list", "Share list", "Invite member"]);
    assert!(tree.tasks.iter().all(|t| t.status == TaskStatus::NotStarted));
}

#[tokio::test]
async fn second_import_adds_only_new_rows() {
    let store = MemoryStore::new();
    let parser = MarkdownProjectParser::new();
    let first = import_outline(&store, &parser, OUTLINE, None, Utc::now()).await.unwrap();

    let revised = format!("{OUTLINE}- [ ] Leave household\n\n## Recipes\n- [ ] Browse\n");
    let second = import_outline(&store, &parser, &revised, Some(first.project_id), Utc::now())
        .await
        .unwrap();

    assert!(!second.project_created);
    assert_eq!(second.screens_created, 1);
    assert_eq!(second.tasks_created, 2);
    assert_eq!(second.tasks_skipped, 3);
    let tree = load_tree(&store, first.project_id).await.unwrap();
    assert_eq!(tree.screens.len(), 3);
    assert_eq!(tree.tasks.len(), 5);
}

#[tokio::test]
async fn repeated_headings_do_not_duplicate_rows() {
    let store = MemoryStore::new();
    let parser = MarkdownProjectParser::new();
    let first = import_outline(&store, &parser, "# P\n## A\n- [ ] a0\n", None, Utc::now())
        .await
        .unwrap();

    let delta = "# P\n## A\n- [ ] x\n## A\n- [ ] x\n## B\n- [ ] y\n## B\n- [ ] z\n";
    let report = import_outline(&store, &parser, delta, Some(first.project_id), Utc::now())
        .await
        .unwrap();

    assert_eq!(report.screens_created, 1);
    assert_eq!(report.tasks_created, 3);
    assert_eq!(report.tasks_skipped, 1);
    let tree = load_tree(&store, first.project_id).await.unwrap();
    let screens: Vec<_> = tree.screens.iter().map(|s| (s.title.as_str(), s.position)).collect();
    assert_eq!(screens, vec![("A", 0), ("B", 1)]);
    let tasks: Vec<_> = tree.tasks.iter().map(|t| (t.title.as_str(), t.position)).collect();
    assert_eq!(tasks, vec![("a0", 0), ("x", 1), ("y", 0), ("z", 1)]);
}

#[tokio::test]
async fn unnamed_outline_writes_nothing() {
    let store = MemoryStore::new();

    let parser = MarkdownProjectParser::new();
    let err = import_outline(&store, &parser, "## Lists\n- [ ] x\n", None, Utc::now())
        .await
        .unwrap_err();

    assert!(matches!(err, ImportError::Parse(ParseError::MissingProjectName)));
    assert!(store.projects().await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_screen_write_keeps_created_project() {
    let mut store = MockPortalStore::new();
    store.expect_insert_project().times(1).returning(|_| Ok(()));
    store
        .expect_insert_screen()
        .times(1)
        .returning(|_| Err(StoreError::Unavailable("connection reset".into())));
    store.expect_insert_task().never();

    let err = import_outline(&store, &MarkdownProjectParser::new(), OUTLINE, None, Utc::now())
        .await
        .unwrap_err();

    assert!(matches!(err, ImportError::Store(StoreError::Unavailable(_))));
}

#[tokio::test]
async fn importing_into_missing_project_is_not_found() {
    let store = MemoryStore::new();

    let err = import_outline(
        &store,
        &MarkdownProjectParser::new(),
        OUTLINE,
        Some(portal_model::ProjectId::new()),
        Utc::now(),
    )
    .await
    .unwrap_err();

    match err {
        ImportError::Store(e) => assert!(e.is_not_found()),
        other => panic!("expected store error, got {other:?}"),
    }
}
