//! Status update workflow
//!
//! 1. `check_changes` diffs the project against the last sent snapshot
//! 2. the admin reviews the result and adds a message
//! 3. `send` mails the update and appends the next baseline
//!
//! The baseline is only written after the mail API accepted the message. A
//! failed send leaves the store exactly as it was, so the same changes are
//! reported again next time.

use crate::error::UpdateError;
use crate::mailer::{MailSettings, Mailer};
use crate::render::StatusEmail;
use chrono::{DateTime, Utc};
use portal_changes::{diff, ChangeSnapshot, ChangesSummary, DiffInput, SentUpdate};
use portal_model::{Project, ProjectId, ScreenId, TaskId, UpdateId};
use portal_store::{load_tree, PortalStore, ProjectTree};
use std::sync::Arc;

/// Result of checking a project for changes
#[derive(Debug, Clone)]
pub enum ChangeCheck {
    /// Nothing was sent yet; the email gives a full overview
    FirstUpdate {
        /// Project row
        project: Project,
        /// Every screen and task, for the overview
        tree: ProjectTree,
    },
    /// Changes since the latest sent update
    Changes {
        /// Project row
        project: Project,
        /// Update the diff was computed against
        baseline: UpdateId,
        /// `sent_at` of the baseline
        since: DateTime<Utc>,
        /// Changes to report
        summary: ChangesSummary,
    },
}

impl ChangeCheck {
    /// Project the check is about
    #[must_use]
    pub fn project(&self) -> &Project {
        match self {
            Self::FirstUpdate { project, .. } | Self::Changes { project, .. } => project,
        }
    }

    /// Baseline update, `None` for a first update
    #[must_use]
    pub fn baseline(&self) -> Option<UpdateId> {
        match self {
            Self::FirstUpdate { .. } => None,
            Self::Changes { baseline, .. } => Some(*baseline),
        }
    }

    /// Computed summary, `None` for a first update
    #[must_use]
    pub fn summary(&self) -> Option<&ChangesSummary> {
        match self {
            Self::FirstUpdate { .. } => None,
            Self::Changes { summary, .. } => Some(summary),
        }
    }

    /// Check if this would be the first update of the project
    #[inline]
    #[must_use]
    pub fn is_first_update(&self) -> bool {
        matches!(self, Self::FirstUpdate { .. })
    }
}

/// What the admin typed in the send dialog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendRequest {
    /// Recipient address
    pub to: String,
    /// Name used in the greeting
    pub recipient_name: Option<String>,
    /// Subject override
    pub subject: Option<String>,
    /// Markdown message shown above the summary
    pub personal_message: Option<String>,
}

impl SendRequest {
    /// Request addressed to `to`
    #[inline]
    #[must_use]
    pub fn new(to: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            ..Self::default()
        }
    }

    /// With greeting name
    #[inline]
    #[must_use]
    pub fn with_recipient_name(mut self, name: impl Into<String>) -> Self {
        self.recipient_name = Some(name.into());
        self
    }

    /// With subject override
    #[inline]
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// With personal message
    #[inline]
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.personal_message = Some(message.into());
        self
    }
}

/// Checks, sends and lists status updates
pub struct StatusUpdates<S: ?Sized, M: ?Sized> {
    store: Arc<S>,
    mailer: Arc<M>,
    settings: MailSettings,
}

impl<S, M> StatusUpdates<S, M>
where
    S: PortalStore + ?Sized,
    M: Mailer + ?Sized,
{
    /// Create service
    #[must_use]
    pub fn new(store: Arc<S>, mailer: Arc<M>, settings: MailSettings) -> Self {
        Self {
            store,
            mailer,
            settings,
        }
    }

    /// Sender settings
    #[inline]
    #[must_use]
    pub fn settings(&self) -> &MailSettings {
        &self.settings
    }

    /// Compute what the next update would report
    ///
    /// # Errors
    /// `UpdateError::Store` if the project is missing or a read fails.
    #[tracing::instrument(skip(self), fields(project = %project_id))]
    pub async fn check_changes(&self, project_id: ProjectId) -> Result<ChangeCheck, UpdateError> {
        let project = self.store.project(project_id).await?;
        let tree = load_tree(&*self.store, project_id).await?;

        let Some(last) = self.store.latest_update(project_id).await? else {
            tracing::info!(screens = tree.screens.len(), "no update sent yet");
            return Ok(ChangeCheck::FirstUpdate { project, tree });
        };

        let screen_ids: Vec<ScreenId> = tree.screens.iter().map(|s| s.id).collect();
        let task_ids: Vec<TaskId> = tree.tasks.iter().map(|t| t.id).collect();
        let screen_edits = self.store.screen_edits(&screen_ids, last.sent_at).await?;
        let task_edits = self.store.task_edits(&task_ids, last.sent_at).await?;

        let summary = diff(
            &DiffInput::new(&tree.screens, &tree.tasks, &last.snapshot.task_statuses, last.sent_at)
                .with_screen_edits(&screen_edits)
                .with_task_edits(&task_edits),
        );
        tracing::info!(
            baseline = %last.id,
            entries = summary.len(),
            has_changes = summary.has_changes(),
            "changes computed"
        );

        Ok(ChangeCheck::Changes {
            project,
            baseline: last.id,
            since: last.sent_at,
            summary,
        })
    }

    /// Send the update described by `check`
    ///
    /// # Errors
    /// See [`Self::send_at`].
    pub async fn send(
        &self,
        check: &ChangeCheck,
        request: &SendRequest,
    ) -> Result<SentUpdate, UpdateError> {
        self.send_at(check, request, Utc::now()).await
    }

    /// Send the update described by `check`, stamping the row with `now`
    ///
    /// # Errors
    /// - `UpdateError::StaleBaseline` if another update was sent after the check
    /// - `UpdateError::Mail` if delivery failed; nothing is written
    /// - `UpdateError::Store` if a read or the final append failed
    #[tracing::instrument(skip_all, fields(project = %check.project().id, to = %request.to))]
    pub async fn send_at(
        &self,
        check: &ChangeCheck,
        request: &SendRequest,
        now: DateTime<Utc>,
    ) -> Result<SentUpdate, UpdateError> {
        let project_id = check.project().id;

        let found = self.store.latest_update(project_id).await?.map(|u| u.id);
        if found != check.baseline() {
            tracing::warn!(
                expected = ?check.baseline(),
                found = ?found,
                "baseline moved since check"
            );
            return Err(UpdateError::StaleBaseline {
                expected: check.baseline(),
                found,
            });
        }

        let message = request
            .personal_message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty());
        let rendered = StatusEmail {
            check,
            recipient_name: request.recipient_name.as_deref(),
            personal_message: message,
            subject: request.subject.as_deref(),
        }
        .render(&self.settings);
        let subject = rendered.subject.clone();
        let email = rendered.into_outgoing(&self.settings, request.to.clone());

        let receipt = self.mailer.send(&email).await.map_err(|e| {
            tracing::error!(error = %e, "status update not delivered");
            e
        })?;

        let tasks = load_tree(&*self.store, project_id).await?.tasks;
        let summary = check.summary().cloned().unwrap_or_default();
        let snapshot = ChangeSnapshot::capture(&tasks, summary);
        let update = SentUpdate::new(project_id, now, snapshot, subject)
            .with_message(message.map(str::to_string));
        self.store.insert_update(&update).await?;

        tracing::info!(
            update = %update.id,
            receipt = ?receipt.id,
            tasks = tasks.len(),
            "status update sent"
        );
        Ok(update)
    }

    /// Sent updates of a project, newest first
    ///
    /// # Errors
    /// `UpdateError::Store` if the read fails.
    pub async fn history(&self, project_id: ProjectId) -> Result<Vec<SentUpdate>, UpdateError> {
        Ok(self.store.updates(project_id).await?)
    }
}
