//! Store seam
//!
//! Everything the portal reads or writes goes through [`PortalStore`]. The
//! hosted database is one implementation; [`crate::MemoryStore`] is another.
//! Services take the store as a constructor argument, never from a global.

use crate::error::StoreResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use portal_changes::SentUpdate;
use portal_model::{
    MilestoneKind, MilestoneRecord, Project, ProjectId, Screen, ScreenEdit, ScreenId, Task,
    TaskEdit,
    TaskId, TaskStatus, UserId, UserProfile,
};

/// Rows the portal persists
///
/// Writes are independent: there are no transactions, and a failure part way
/// through a sequence of calls leaves the earlier writes in place.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait PortalStore: Send + Sync {
    /// Insert a project row
    async fn insert_project(&self, project: &Project) -> StoreResult<()>;

    /// Replace a project row
    async fn update_project(&self, project: &Project) -> StoreResult<()>;

    /// Load a project
    async fn project(&self, id: ProjectId) -> StoreResult<Project>;

    /// All projects, oldest first
    async fn projects(&self) -> StoreResult<Vec<Project>>;

    /// Insert a screen row
    async fn insert_screen(&self, screen: &Screen) -> StoreResult<()>;

    /// Replace a screen row, recording a [`ScreenEdit`] when title or
    /// description changed
    async fn update_screen(&self, screen: &Screen, at: DateTime<Utc>) -> StoreResult<()>;

    /// Screens of a project ordered by position
    async fn screens(&self, project: ProjectId) -> StoreResult<Vec<Screen>>;

    /// Screen edits newer than `since`
    async fn screen_edits(
        &self,
        screens: &[ScreenId],
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<ScreenEdit>>;

    /// Insert a task row
    async fn insert_task(&self, task: &Task) -> StoreResult<()>;

    /// Move a task to `status`, recording a [`TaskEdit`] when it changed
    async fn set_task_status(
        &self,
        id: TaskId,
        status: TaskStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<Task>;

    /// Tasks of the given screens, in screen order then position
    async fn tasks(&self, screens: &[ScreenId]) -> StoreResult<Vec<Task>>;

    /// Task edits newer than `since`
    async fn task_edits(
        &self,
        tasks: &[TaskId],
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<TaskEdit>>;

    /// Append a sent update
    async fn insert_update(&self, update: &SentUpdate) -> StoreResult<()>;

    /// Most recent sent update of a project
    async fn latest_update(&self, project: ProjectId) -> StoreResult<Option<SentUpdate>>;

    /// All sent updates of a project, newest first
    async fn updates(&self, project: ProjectId) -> StoreResult<Vec<SentUpdate>>;

    /// Insert a user profile; emails are unique
    async fn insert_user(&self, user: &UserProfile) -> StoreResult<()>;

    /// Load a user profile
    async fn user(&self, id: UserId) -> StoreResult<UserProfile>;

    /// All user profiles, oldest first
    async fn users(&self) -> StoreResult<Vec<UserProfile>>;

    /// Milestone of one kind, if it was ever set
    async fn milestone(
        &self,
        project: ProjectId,
        kind: MilestoneKind,
    ) -> StoreResult<Option<MilestoneRecord>>;

    /// Insert or replace the milestone of the record's kind
    async fn save_milestone(&self, record: &MilestoneRecord) -> StoreResult<()>;

    /// All milestones of a project
    async fn milestones(&self, project: ProjectId) -> StoreResult<Vec<MilestoneRecord>>;
}

/// Screens and tasks of one project
#[derive(Debug, Clone, Default)]
pub struct ProjectTree {
    /// Screens by position
    pub screens: Vec<Screen>,
    /// Tasks grouped by screen, then by position
    pub tasks: Vec<Task>,
}

impl ProjectTree {
    /// Tasks of one screen, in stored order
    pub fn tasks_of(&self, screen: ScreenId) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(move |t| t.screen_id == screen)
    }
}

/// Load every screen and task of a project
pub async fn load_tree<S: PortalStore + ?Sized>(
    store: &S,
    project: ProjectId,
) -> StoreResult<ProjectTree> {
    let screens = store.screens(project).await?;
    let ids: Vec<ScreenId> = screens.iter().map(|s| s.id).collect();
    let tasks = store.tasks(&ids).await?;
    Ok(ProjectTree { screens, tasks })
}
