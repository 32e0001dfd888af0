//! Task status

use crate::error::UnknownVariant;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Progress of a single task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Nobody has picked it up yet
    #[default]
    NotStarted,
    /// Being built
    InProgress,
    /// Blocked on the client or a third party
    Waiting,
    /// Ready for the client to look at
    Review,
    /// Accepted and finished
    Done,
}

impl TaskStatus {
    /// All statuses in workflow order
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::NotStarted,
        TaskStatus::InProgress,
        TaskStatus::Waiting,
        TaskStatus::Review,
        TaskStatus::Done,
    ];

    /// Wire name, as stored in the database
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "not_started",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Waiting => "waiting",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
        }
    }

    /// Human readable label used in emails
    #[inline]
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "Not started",
            TaskStatus::InProgress => "In progress",
            TaskStatus::Waiting => "Waiting",
            TaskStatus::Review => "Ready for review",
            TaskStatus::Done => "Done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| UnknownVariant::new("task status", s))
    }
}
