//! What changed since the last status update
//!
//! Field names serialize in camelCase because the summary is stored verbatim
//! inside the snapshot JSON of each sent update.

use chrono::{DateTime, Utc};
use portal_model::TaskId;
use serde::{Deserialize, Serialize};

/// A task reported in one of the review buckets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    /// Task row
    pub task_id: TaskId,
    /// Task title
    pub title: String,
    /// Title of the task's screen
    pub screen_title: String,
}

/// A task that was finished since the last update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedTask {
    /// Task title
    pub title: String,
    /// Title of the task's screen
    pub screen_title: String,
    /// Timestamp of the edit that moved it to `done`
    pub edited_at: DateTime<Utc>,
}

/// A screen created since the last update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewScreen {
    /// Screen title
    pub title: String,
    /// Row creation time
    pub created_at: DateTime<Utc>,
}

/// One recorded edit of a screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedScreen {
    /// Title after the edit
    pub title: String,
    /// Description after the edit
    pub description: Option<String>,
    /// Edit time
    pub edited_at: DateTime<Utc>,
}

/// A task created since the last update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    /// Task title
    pub title: String,
    /// Title of the task's screen
    pub screen_title: String,
    /// Row creation time
    pub created_at: DateTime<Utc>,
}

/// Flat change buckets, in the order current rows were iterated
///
/// A summary is recomputed on every check and never edited afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChangesSummary {
    /// Every task currently waiting for client review
    pub review_tasks: Vec<ReviewItem>,
    /// Tasks that left review as accepted
    pub review_to_done: Vec<ReviewItem>,
    /// Tasks that went back from review to development
    pub review_to_progress: Vec<ReviewItem>,
    /// Tasks finished without passing through review
    pub completed_tasks: Vec<CompletedTask>,
    /// Screens created since the baseline
    pub new_screens: Vec<NewScreen>,
    /// Screen edits since the baseline, one per edit
    pub updated_screens: Vec<UpdatedScreen>,
    /// Tasks created since the baseline
    pub new_tasks: Vec<NewTask>,
}

impl ChangesSummary {
    /// True when every bucket is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.review_tasks.is_empty() && !self.has_changes()
    }

    /// True when anything other than the review listing changed
    ///
    /// `review_tasks` is a standing list rather than a change, so it does not
    /// count here.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !(self.review_to_done.is_empty()
            && self.review_to_progress.is_empty()
            && self.completed_tasks.is_empty()
            && self.new_screens.is_empty()
            && self.updated_screens.is_empty()
            && self.new_tasks.is_empty())
    }

    /// Total number of reported entries across all buckets
    #[must_use]
    pub fn len(&self) -> usize {
        self.review_tasks.len()
            + self.review_to_done.len()
            + self.review_to_progress.len()
            + self.completed_tasks.len()
            + self.new_screens.len()
            + self.updated_screens.len()
            + self.new_tasks.len()
    }
}
