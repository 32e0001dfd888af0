//! Admin actions
//!
//! Each action returns the text the binary prints, so the same code paths are
//! exercised by the integration tests.

use crate::app::Portal;
use crate::search::{rank, Ranked, Searchable};
use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use portal_changes::SentUpdate;
use portal_import::{apply, plan_outline, ImportTarget, ParsedProject, ScreenTarget};
use portal_model::{
    MilestoneUpdate, Project, ProjectId, Task, TaskId, TaskStatus, UserProfile, UserRole,
};
use portal_notify::{notify_profile_created, ChangeCheck, SendRequest, StatusEmail};
use portal_store::load_tree;
use std::fmt::Write as _;

/// What `search` looks through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// Project names, taglines and descriptions
    Projects,
    /// Task titles and descriptions across every project
    Tasks,
    /// User names and emails
    Users,
}

impl std::str::FromStr for SearchScope {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "projects" | "project" => Ok(Self::Projects),
            "tasks" | "task" => Ok(Self::Tasks),
            "users" | "user" => Ok(Self::Users),
            other => bail!("unknown search scope '{other}' (expected projects, tasks or users)"),
        }
    }
}

/// Outline tree as indented text
#[must_use]
pub fn preview(parsed: &ParsedProject) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", parsed.name);
    if let Some(tagline) = &parsed.tagline {
        let _ = writeln!(out, "  {tagline}");
    }
    let _ = writeln!(out, "  {}", parsed.description);
    for screen in &parsed.screens {
        let _ = writeln!(out, "\n## {} ({} tasks)", screen.title, screen.tasks.len());
        if let Some(description) = &screen.description {
            let _ = writeln!(out, "   {description}");
        }
        for task in &screen.tasks {
            let _ = writeln!(out, "   - {}", task.title);
        }
    }
    let _ = writeln!(
        out,
        "\n{} screens, {} tasks",
        parsed.screens.len(),
        parsed.task_count()
    );
    out
}

/// Import an outline, or only describe the plan when `plan_only` is set
///
/// # Errors
/// Parse failures, a missing target project, store failures.
pub async fn import(
    portal: &Portal,
    content: &str,
    into: Option<ProjectId>,
    plan_only: bool,
    now: DateTime<Utc>,
) -> anyhow::Result<String> {
    let plan = plan_outline(portal.store(), portal.parser(), content, into).await?;

    if plan_only {
        let mut out = String::new();
        match &plan.target {
            ImportTarget::NewProject { name, .. } => {
                let _ = writeln!(out, "Would create project '{name}'");
            }
            ImportTarget::Existing { project_id } => {
                let _ = writeln!(out, "Would update project {project_id}");
            }
        }
        for screen in &plan.screens {
            let verb = match &screen.target {
                ScreenTarget::Create { .. } => "new",
                ScreenTarget::Existing { .. } => "existing",
            };
            let _ = writeln!(
                out,
                "  {} screen '{}': {} new tasks",
                verb,
                screen.target.title(),
                screen.tasks.len()
            );
        }
        let _ = writeln!(
            out,
            "{} screens and {} tasks to create, {} tasks already present",
            plan.screens_to_create(),
            plan.tasks_to_create(),
            plan.skipped_tasks
        );
        return Ok(out);
    }

    let report = apply(portal.store(), &plan, now).await?;
    Ok(format!(
        "{} project {}: {} screens and {} tasks created, {} tasks already present\n",
        if report.project_created { "Created" } else { "Updated" },
        report.project_id,
        report.screens_created,
        report.tasks_created,
        report.tasks_skipped
    ))
}

/// Describe what the next status update would contain
///
/// # Errors
/// Missing project or store failures.
pub async fn changes(portal: &Portal, project: ProjectId) -> anyhow::Result<String> {
    let check = portal.updates().check_changes(project).await?;
    Ok(describe_check(portal, &check))
}

fn describe_check(portal: &Portal, check: &ChangeCheck) -> String {
    let mut out = String::new();
    match check {
        ChangeCheck::FirstUpdate { tree, .. } => {
            let _ = writeln!(
                out,
                "No update sent yet; the first email gives an overview of {} screens and {} tasks.",
                tree.screens.len(),
                tree.tasks.len()
            );
        }
        ChangeCheck::Changes { summary, since, .. } => {
            let _ = writeln!(
                out,
                "{} entries since {} ({} awaiting review).",
                summary.len(),
                since.format("%Y-%m-%d %H:%M UTC"),
                summary.review_tasks.len()
            );
        }
    }
    let email = StatusEmail::new(check).render(portal.settings());
    let _ = writeln!(out, "\nSubject: {}\n", email.subject);
    out.push_str(&email.text);
    out
}

/// Check for changes and send them in one step
///
/// # Errors
/// Store failures, a rejected email, or a concurrent send.
pub async fn send(
    portal: &Portal,
    project: ProjectId,
    request: &SendRequest,
    now: DateTime<Utc>,
) -> anyhow::Result<String> {
    let updates = portal.updates();
    let check = updates.check_changes(project).await?;
    if check.summary().is_some_and(|s| s.is_empty()) {
        tracing::info!(project = %project, "sending update without changes");
    }
    let sent = updates
        .send_at(&check, request, now)
        .await
        .with_context(|| format!("update for project {project} was not sent"))?;
    Ok(format!(
        "Sent '{}' to {} (update {}, {} tasks in snapshot)\n",
        sent.email_subject,
        request.to,
        sent.id,
        sent.snapshot.task_statuses.len()
    ))
}

/// Sent updates, newest first
///
/// # Errors
/// Store failures.
pub async fn history(portal: &Portal, project: ProjectId) -> anyhow::Result<String> {
    let updates: Vec<SentUpdate> = portal.updates().history(project).await?;
    if updates.is_empty() {
        return Ok("No updates sent yet.\n".to_string());
    }
    let mut out = String::new();
    for update in &updates {
        let _ = writeln!(
            out,
            "{}  {}  {} changes  {}",
            update.sent_at.format("%Y-%m-%d %H:%M"),
            update.id,
            update.snapshot.summary.len(),
            update.email_subject
        );
    }
    Ok(out)
}

/// Move a task to a new status
///
/// # Errors
/// Missing task or store failures.
pub async fn set_status(
    portal: &Portal,
    task: TaskId,
    status: TaskStatus,
    now: DateTime<Utc>,
) -> anyhow::Result<String> {
    let task: Task = portal
        .store()
        .set_task_status(task, status, now)
        .await
        .context("failed to update task")?;
    Ok(format!("'{}' is now {}\n", task.title, task.status.label()))
}

/// Apply a milestone update
///
/// # Errors
/// Missing project, kind mismatch or store failures. Mail failures are not
/// errors.
pub async fn milestone(
    portal: &Portal,
    project: ProjectId,
    update: MilestoneUpdate,
    now: DateTime<Utc>,
) -> anyhow::Result<String> {
    let change = portal.milestones().update_at(project, update, now).await?;
    Ok(format!(
        "{}{}\n",
        change.record.milestone.describe(),
        if change.notified { " (client notified)" } else { "" }
    ))
}

/// Create a user, optionally attach them as a project's client, and send
/// the welcome email
///
/// # Errors
/// Duplicate email, missing project or store failures.
pub async fn add_user(
    portal: &Portal,
    email: &str,
    name: &str,
    role: UserRole,
    project: Option<ProjectId>,
    now: DateTime<Utc>,
) -> anyhow::Result<String> {
    let email = email.trim();
    if !email.contains('@') {
        bail!("'{email}' is not an email address");
    }
    let user = UserProfile::client(email, name.trim(), now).with_role(role);
    portal.store().insert_user(&user).await.context("failed to create user")?;

    let mut out = format!("Created {} {} ({})\n", user.role, user.id, user.email);
    if let Some(project_id) = project {
        let project: Project = portal.store().project(project_id).await?;
        let project = project.with_client(user.id);
        portal.store().update_project(&project).await?;
        let _ = writeln!(out, "Client of '{}'", project.name);
    }

    if notify_profile_created(portal.mailer(), portal.settings(), &user).await {
        out.push_str("Welcome email sent\n");
    } else {
        out.push_str("Welcome email was not delivered\n");
    }
    Ok(out)
}

/// All projects, oldest first
///
/// # Errors
/// Store failures.
pub async fn projects(portal: &Portal) -> anyhow::Result<String> {
    let projects = portal.store().projects().await?;
    let mut out = String::new();
    for project in &projects {
        let tree = load_tree(portal.store(), project.id).await?;
        let done = tree.tasks.iter().filter(|t| t.status == TaskStatus::Done).count();
        let _ = writeln!(
            out,
            "{}  {}  {}/{} tasks done",
            project.id,
            project.name,
            done,
            tree.tasks.len()
        );
    }
    if projects.is_empty() {
        out.push_str("No projects yet.\n");
    }
    Ok(out)
}

fn format_ranked<T: Searchable>(ranked: &[Ranked<&T>], line: impl Fn(&T) -> String) -> String {
    let mut out = String::new();
    for r in ranked {
        let _ = writeln!(out, "{:>4}  {}", r.score, line(r.item));
    }
    if ranked.is_empty() {
        out.push_str("No matches.\n");
    }
    out
}

/// Search one kind of record
///
/// # Errors
/// Store failures.
pub async fn search(portal: &Portal, query: &str, scope: SearchScope) -> anyhow::Result<String> {
    let store = portal.store();
    Ok(match scope {
        SearchScope::Projects => {
            let projects = store.projects().await?;
            format_ranked(&rank(query, &projects), |p| format!("{}  {}", p.id, p.name))
        }
        SearchScope::Tasks => {
            let mut tasks = Vec::new();
            for project in store.projects().await? {
                tasks.extend(load_tree(store, project.id).await?.tasks);
            }
            format_ranked(&rank(query, &tasks), |t| {
                format!("{}  {} [{}]", t.id, t.title, t.status)
            })
        }
        SearchScope::Users => {
            let users = store.users().await?;
            format_ranked(&rank(query, &users), |u| {
                format!("{}  {} <{}>", u.id, u.display_name, u.email)
            })
        }
    })
}
