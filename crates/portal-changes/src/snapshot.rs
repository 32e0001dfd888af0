//! Baseline captured when a status update is sent
//!
//! Each successful send appends a [`SentUpdate`]. Its snapshot records the
//! status of every task at send time and becomes the baseline for the next
//! diff. Rows are never edited or deleted.

use crate::summary::ChangesSummary;
use chrono::{DateTime, Utc};
use portal_model::{ProjectId, Task, TaskId, TaskStatus, UpdateId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Task id → status at send time
pub type TaskStatusMap = BTreeMap<TaskId, TaskStatus>;

/// Stored `changes_snapshot` JSON
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSnapshot {
    /// Status of every task at send time
    #[serde(default)]
    pub task_statuses: TaskStatusMap,
    /// The summary that was reported, kept for history display
    #[serde(default)]
    pub summary: ChangesSummary,
}

impl ChangeSnapshot {
    /// Capture the current task rows together with the reported summary
    #[must_use]
    pub fn capture<'a>(tasks: impl IntoIterator<Item = &'a Task>, summary: ChangesSummary) -> Self {
        let task_statuses: TaskStatusMap = tasks.into_iter().map(|t| (t.id, t.status)).collect();
        tracing::debug!(tasks = task_statuses.len(), "captured task status snapshot");
        Self {
            task_statuses,
            summary,
        }
    }
}

/// One sent status-update email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentUpdate {
    /// Row id
    pub id: UpdateId,
    /// Project the update was about
    pub project_id: ProjectId,
    /// When the email went out
    pub sent_at: DateTime<Utc>,
    /// Baseline for the next diff
    #[serde(rename = "changes_snapshot")]
    pub snapshot: ChangeSnapshot,
    /// Subject line used
    pub email_subject: String,
    /// Free-text message the admin added
    pub personal_message: Option<String>,
}

impl SentUpdate {
    /// Create new row
    #[must_use]
    pub fn new(
        project_id: ProjectId,
        sent_at: DateTime<Utc>,
        snapshot: ChangeSnapshot,
        email_subject: impl Into<String>,
    ) -> Self {
        Self {
            id: UpdateId::new(),
            project_id,
            sent_at,
            snapshot,
            email_subject: email_subject.into(),
            personal_message: None,
        }
    }

    /// With personal message
    #[inline]
    #[must_use]
    pub fn with_message(mut self, message: Option<String>) -> Self {
        self.personal_message = message;
        self
    }
}
