//! End-to-end admin workflows against an in-memory store

use portal_admin::{commands, Portal};
use portal_model::{
    InvoiceStatus, InvoiceUpdate, MilestoneUpdate, TaskStatus, UserRole,
};
use portal_notify::{MailSettings, SendRequest, UpdateError};
use portal_store::{load_tree, MemoryStore, PortalStore};
use portal_test_utils::{may, seeded_store, task_named, RecordingMailer, SAMPLE_OUTLINE};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn portal(store: Arc<MemoryStore>, mailer: Arc<RecordingMailer>) -> Portal {
    Portal::new(store, mailer, MailSettings::default())
}

#[tokio::test]
async fn import_then_first_update_snapshots_every_task() {
    let store = Arc::new(MemoryStore::new());
    let mailer = Arc::new(RecordingMailer::new());
    let portal = portal(store.clone(), mailer.clone());

    let out = commands::import(&portal, SAMPLE_OUTLINE, None, false, may(1, 9))
        .await
        .unwrap();
    assert!(out.contains("2 screens and 3 tasks created"));

    let project = store.projects().await.unwrap().remove(0);
    let check = portal.updates().check_changes(project.id).await.unwrap();
    assert!(check.is_first_update());

    let sent = portal
        .updates()
        .send_at(&check, &SendRequest::new("ana@client.example"), may(1, 10))
        .await
        .unwrap();

    let tree = load_tree(&*store, project.id).await.unwrap();
    assert_eq!(tree.tasks.len(), 3);
    assert_eq!(sent.snapshot.task_statuses.len(), 3);
    for task in &tree.tasks {
        assert_eq!(sent.snapshot.task_statuses.get(&task.id), Some(&TaskStatus::NotStarted));
    }

    let email = mailer.last().unwrap();
    assert_eq!(email.subject, "Project update: Pantry");
    assert!(email.text.contains("Project overview"));
    assert!(email.text.contains("Invite household - Not started"));
}

#[tokio::test]
async fn second_update_reports_only_new_changes() {
    let (store, report) = seeded_store().await;
    let mailer = Arc::new(RecordingMailer::new());
    let portal = portal(store.clone(), mailer.clone());
    let request = SendRequest::new("ana@client.example");

    commands::send(&portal, report.project_id, &request, may(1, 10)).await.unwrap();

    let create = task_named(&store, report.project_id, "Create list").await;
    let share = task_named(&store, report.project_id, "Share list").await;
    commands::set_status(&portal, create.id, TaskStatus::Done, may(2, 9)).await.unwrap();
    commands::set_status(&portal, share.id, TaskStatus::Review, may(2, 10)).await.unwrap();

    let preview = commands::changes(&portal, report.project_id).await.unwrap();
    assert!(preview.contains("Ready for your review\n  Lists\n    - Share list\n"));
    assert!(preview.contains("Completed\n  Lists\n    - Create list (done 2026-05-02)\n"));

    commands::send(&portal, report.project_id, &request, may(3, 9)).await.unwrap();
    let check = portal.updates().check_changes(report.project_id).await.unwrap();
    let summary = check.summary().unwrap();
    assert!(!summary.has_changes());
    assert_eq!(summary.review_tasks.len(), 1);

    let history = commands::history(&portal, report.project_id).await.unwrap();
    assert_eq!(history.lines().count(), 2);
    assert_eq!(mailer.sent().len(), 2);
}

#[tokio::test]
async fn stale_check_aborts_and_writes_nothing() {
    let (store, report) = seeded_store().await;
    let portal = portal(store.clone(), Arc::new(RecordingMailer::new()));
    let updates = portal.updates();
    let request = SendRequest::new("ana@client.example");

    let stale = updates.check_changes(report.project_id).await.unwrap();
    commands::send(&portal, report.project_id, &request, may(1, 10)).await.unwrap();

    let err = updates.send_at(&stale, &request, may(1, 11)).await.unwrap_err();
    assert!(matches!(err, UpdateError::StaleBaseline { expected: None, found: Some(_) }));
    assert_eq!(store.updates(report.project_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn failed_mail_keeps_changes_for_next_time() {
    let (store, report) = seeded_store().await;
    let mailer = Arc::new(RecordingMailer::new());
    let portal = portal(store.clone(), mailer.clone());
    let request = SendRequest::new("ana@client.example");
    commands::send(&portal, report.project_id, &request, may(1, 10)).await.unwrap();

    let share = task_named(&store, report.project_id, "Share list").await;
    commands::set_status(&portal, share.id, TaskStatus::InProgress, may(2, 9)).await.unwrap();

    mailer.set_failing(true);
    let err = commands::send(&portal, report.project_id, &request, may(2, 10)).await.unwrap_err();
    assert!(err.to_string().contains("was not sent"));
    assert_eq!(store.updates(report.project_id).await.unwrap().len(), 1);

    mailer.set_failing(false);
    let check = portal.updates().check_changes(report.project_id).await.unwrap();
    assert!(check.summary().is_some());
    commands::send(&portal, report.project_id, &request, may(2, 11)).await.unwrap();
    assert_eq!(store.updates(report.project_id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn reimport_adds_only_missing_rows() {
    let (store, report) = seeded_store().await;
    let portal = portal(store.clone(), Arc::new(RecordingMailer::new()));
    let extended =
        format!("{SAMPLE_OUTLINE}- [ ] Leave household\n\n## Recipes\n- [ ] Browse recipes\n");

    let plan = commands::import(&portal, &extended, Some(report.project_id), true, may(2, 9))
        .await
        .unwrap();
    assert!(plan.contains("1 screens and 2 tasks to create, 3 tasks already present"));

    commands::import(&portal, &extended, Some(report.project_id), false, may(2, 9))
        .await
        .unwrap();
    let tree = load_tree(&*store, report.project_id).await.unwrap();
    assert_eq!(tree.screens.len(), 3);
    assert_eq!(tree.tasks.len(), 5);
}

#[tokio::test]
async fn milestone_notice_failure_does_not_fail_update() {
    let (store, report) = seeded_store().await;
    let mailer = Arc::new(RecordingMailer::new());
    let portal = portal(store.clone(), mailer.clone());

    let out = commands::add_user(
        &portal,
        "ana@client.example",
        "Ana",
        UserRole::Client,
        Some(report.project_id),
        may(1, 9),
    )
    .await
    .unwrap();
    assert!(out.contains("Welcome email sent"));

    mailer.set_failing(true);
    let out = commands::milestone(
        &portal,
        report.project_id,
        MilestoneUpdate::Invoice(InvoiceUpdate {
            status: Some(InvoiceStatus::Sent),
            amount_cents: Some(150_000),
            ..InvoiceUpdate::default()
        }),
        may(2, 9),
    )
    .await
    .unwrap();

    assert_eq!(out, "Invoice: Sent (1500.00)\n");
    assert_eq!(store.milestones(report.project_id).await.unwrap().len(), 1);
    assert_eq!(mailer.sent().len(), 1);
}

#[tokio::test]
async fn duplicate_user_email_is_refused() {
    let (store, _) = seeded_store().await;
    let portal = portal(store, Arc::new(RecordingMailer::new()));

    commands::add_user(&portal, "ana@client.example", "Ana", UserRole::Client, None, may(1, 9))
        .await
        .unwrap();
    let err = commands::add_user(
        &portal,
        "ANA@client.example",
        "Ana B",
        UserRole::Client,
        None,
        may(1, 9),
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("failed to create user"));
}

#[tokio::test]
async fn search_finds_tasks_across_projects() {
    let (store, _) = seeded_store().await;
    let portal = portal(store, Arc::new(RecordingMailer::new()));

    let out = commands::search(&portal, "list", portal_admin::commands::SearchScope::Tasks)
        .await
        .unwrap();
    let titles: Vec<&str> = out.lines().collect();
    assert_eq!(titles.len(), 2);
    assert!(titles[0].contains("Create list"));
    assert!(titles[1].contains("Share list"));
}
