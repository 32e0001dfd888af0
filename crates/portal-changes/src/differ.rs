//! Change detection
//!
//! Compares current project rows with the task statuses stored at the last
//! send. The comparison is a pure function of its input: the caller reads
//! rows from the store and decides what to do with the result.

use crate::snapshot::TaskStatusMap;
use crate::summary::{ChangesSummary, CompletedTask, NewScreen, NewTask, ReviewItem, UpdatedScreen};
use chrono::{DateTime, Utc};
use portal_model::{Screen, ScreenEdit, ScreenId, Task, TaskEdit, TaskId, TaskStatus};
use std::collections::HashMap;

/// Title used when a task points at a screen that was not loaded
pub const UNKNOWN_SCREEN: &str = "Untitled screen";

/// Everything the differ looks at
#[derive(Debug, Clone, Copy)]
pub struct DiffInput<'a> {
    /// Current screens of the project
    pub screens: &'a [Screen],
    /// Current tasks of those screens
    pub tasks: &'a [Task],
    /// Screen edit rows; rows at or before `since` are ignored
    pub screen_edits: &'a [ScreenEdit],
    /// Task edit rows; rows at or before `since` are ignored
    pub task_edits: &'a [TaskEdit],
    /// Task statuses stored at the last send
    pub previous: &'a TaskStatusMap,
    /// Time of the last send
    pub since: DateTime<Utc>,
}

impl<'a> DiffInput<'a> {
    /// Input with no history rows
    #[must_use]
    pub fn new(
        screens: &'a [Screen],
        tasks: &'a [Task],
        previous: &'a TaskStatusMap,
        since: DateTime<Utc>,
    ) -> Self {
        Self {
            screens,
            tasks,
            screen_edits: &[],
            task_edits: &[],
            previous,
            since,
        }
    }

    /// With screen edit rows
    #[inline]
    #[must_use]
    pub fn with_screen_edits(mut self, edits: &'a [ScreenEdit]) -> Self {
        self.screen_edits = edits;
        self
    }

    /// With task edit rows
    #[inline]
    #[must_use]
    pub fn with_task_edits(mut self, edits: &'a [TaskEdit]) -> Self {
        self.task_edits = edits;
        self
    }
}

/// Compute what changed since the last send
///
/// Review buckets are derived from status alone. `completed_tasks` also
/// requires a `done` transition in the edit history after `since`, which
/// supplies the reported timestamp; a task that is `done` without such a row
/// is left out.
#[must_use]
pub fn diff(input: &DiffInput<'_>) -> ChangesSummary {
    let since = input.since;
    let screen_titles: HashMap<ScreenId, &str> = input
        .screens
        .iter()
        .map(|s| (s.id, s.title.as_str()))
        .collect();
    let screen_title = |id: &ScreenId| {
        screen_titles
            .get(id)
            .copied()
            .unwrap_or(UNKNOWN_SCREEN)
            .to_string()
    };

    let mut done_at: HashMap<TaskId, DateTime<Utc>> = HashMap::new();
    for edit in input
        .task_edits
        .iter()
        .filter(|e| e.edited_at > since && e.is_transition_to(TaskStatus::Done))
    {
        done_at
            .entry(edit.task_id)
            .and_modify(|at| *at = (*at).max(edit.edited_at))
            .or_insert(edit.edited_at);
    }

    let mut summary = ChangesSummary::default();

    for task in input.tasks {
        let previous = input.previous.get(&task.id).copied();
        let review_item = || ReviewItem {
            task_id: task.id,
            title: task.title.clone(),
            screen_title: screen_title(&task.screen_id),
        };

        if task.status == TaskStatus::Review {
            summary.review_tasks.push(review_item());
        }

        match (previous, task.status) {
            (Some(TaskStatus::Review), TaskStatus::Done) => {
                summary.review_to_done.push(review_item());
            }
            (Some(TaskStatus::Review), TaskStatus::InProgress) => {
                summary.review_to_progress.push(review_item());
            }
            (Some(TaskStatus::Done), TaskStatus::Done) => {}
            (_, TaskStatus::Done) => {
                if let Some(edited_at) = done_at.get(&task.id) {
                    summary.completed_tasks.push(CompletedTask {
                        title: task.title.clone(),
                        screen_title: screen_title(&task.screen_id),
                        edited_at: *edited_at,
                    });
                }
            }
            _ => {}
        }

        if task.created_at > since {
            summary.new_tasks.push(NewTask {
                title: task.title.clone(),
                screen_title: screen_title(&task.screen_id),
                created_at: task.created_at,
            });
        }
    }

    summary.new_screens = input
        .screens
        .iter()
        .filter(|s| s.created_at > since)
        .map(|s| NewScreen {
            title: s.title.clone(),
            created_at: s.created_at,
        })
        .collect();

    summary.updated_screens = input
        .screen_edits
        .iter()
        .filter(|e| e.edited_at > since)
        .map(|e| UpdatedScreen {
            title: e.title.clone(),
            description: e.description.clone(),
            edited_at: e.edited_at,
        })
        .collect();

    tracing::debug!(
        review = summary.review_tasks.len(),
        review_to_done = summary.review_to_done.len(),
        review_to_progress = summary.review_to_progress.len(),
        completed = summary.completed_tasks.len(),
        new_screens = summary.new_screens.len(),
        updated_screens = summary.updated_screens.len(),
        new_tasks = summary.new_tasks.len(),
        "computed change summary"
    );

    summary
}
