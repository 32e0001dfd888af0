//! In-memory store with optional JSON-file persistence
//!
//! All rows live in one document behind a `parking_lot::RwLock`. When opened
//! with a path, the whole document is written back after every successful
//! write (write to a temp file, then rename). The row lock is never held across
//! an `.await`; file writes are serialized by a separate async lock and each
//! one encodes the document as it is when the write starts, so the file only
//! moves forward. A failed write leaves memory ahead of the file until the
//! next successful one rewrites the whole document.

use crate::error::{StoreError, StoreResult};
use crate::store::PortalStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use portal_changes::SentUpdate;
use portal_model::{
    MilestoneKind, MilestoneRecord, Project, ProjectId, Screen, ScreenEdit, ScreenId, Task,
    TaskChange, TaskEdit, TaskId, TaskStatus, UserId, UserProfile,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct StoreState {
    projects: Vec<Project>,
    screens: Vec<Screen>,
    screen_edits: Vec<ScreenEdit>,
    tasks: Vec<Task>,
    task_edits: Vec<TaskEdit>,
    updates: Vec<SentUpdate>,
    users: Vec<UserProfile>,
    milestones: Vec<MilestoneRecord>,
}

/// Store keeping every row in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
    path: Option<PathBuf>,
    persist_lock: Mutex<()>,
}

impl MemoryStore {
    /// Create empty, unpersisted store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a store backed by a JSON file
    ///
    /// A missing file starts an empty store; it is created on the first write.
    ///
    /// # Errors
    /// - `StoreError::Io` if the file exists but cannot be read
    /// - `StoreError::Serialization` if it is not a store document
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let state = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "store file missing, starting empty");
                StoreState::default()
            }
            Err(e) => return Err(StoreError::io_error(path, e)),
        };
        Ok(Self {
            state: RwLock::new(state),
            path: Some(path),
            persist_lock: Mutex::new(()),
        })
    }

    /// Backing file, if any
    #[inline]
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn write<R>(&self, f: impl FnOnce(&mut StoreState) -> StoreResult<R>) -> StoreResult<R> {
        let mut guard = self.state.write();
        f(&mut guard)
    }

    fn read<R>(&self, f: impl FnOnce(&StoreState) -> R) -> R {
        let guard = self.state.read();
        f(&guard)
    }

    async fn persist(&self) -> StoreResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let _writing = self.persist_lock.lock().await;
        let body = {
            let guard = self.state.read();
            serde_json::to_vec_pretty(&*guard)?
        };
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| StoreError::io_error(&tmp, e))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| StoreError::io_error(path, e))?;
        Ok(())
    }
}

#[async_trait]
impl PortalStore for MemoryStore {
    async fn insert_project(&self, project: &Project) -> StoreResult<()> {
        self.write(|state| {
            if state.projects.iter().any(|p| p.id == project.id) {
                return Err(StoreError::Conflict(format!(
                    "project {} already exists",
                    project.id
                )));
            }
            state.projects.push(project.clone());
            Ok(())
        })?;
        self.persist().await
    }

    async fn update_project(&self, project: &Project) -> StoreResult<()> {
        self.write(|state| {
            let row = state
                .projects
                .iter_mut()
                .find(|p| p.id == project.id)
                .ok_or_else(|| StoreError::not_found("project", project.id))?;
            *row = project.clone();
            Ok(())
        })?;
        self.persist().await
    }

    async fn project(&self, id: ProjectId) -> StoreResult<Project> {
        self.read(|state| state.projects.iter().find(|p| p.id == id).cloned())
            .ok_or_else(|| StoreError::not_found("project", id))
    }

    async fn projects(&self) -> StoreResult<Vec<Project>> {
        Ok(self.read(|state| state.projects.clone()))
    }

    async fn insert_screen(&self, screen: &Screen) -> StoreResult<()> {
        self.write(|state| {
            if !state.projects.iter().any(|p| p.id == screen.project_id) {
                return Err(StoreError::not_found("project", screen.project_id));
            }
            state.screens.push(screen.clone());
            Ok(())
        })?;
        self.persist().await
    }

    async fn update_screen(&self, screen: &Screen, at: DateTime<Utc>) -> StoreResult<()> {
        self.write(|state| {
            let row = state
                .screens
                .iter_mut()
                .find(|s| s.id == screen.id)
                .ok_or_else(|| StoreError::not_found("screen", screen.id))?;
            let edited = row.title != screen.title || row.description != screen.description;
            *row = screen.clone();
            if edited {
                state.screen_edits.push(ScreenEdit {
                    screen_id: screen.id,
                    title: screen.title.clone(),
                    description: screen.description.clone(),
                    edited_at: at,
                });
            }
            Ok(())
        })?;
        self.persist().await
    }

    async fn screens(&self, project: ProjectId) -> StoreResult<Vec<Screen>> {
        let mut screens: Vec<Screen> = self.read(|state| {
            state
                .screens
                .iter()
                .filter(|s| s.project_id == project)
                .cloned()
                .collect()
        });
        screens.sort_by_key(|s| s.position);
        Ok(screens)
    }

    async fn screen_edits(
        &self,
        screens: &[ScreenId],
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<ScreenEdit>> {
        Ok(self.read(|state| {
            state
                .screen_edits
                .iter()
                .filter(|e| e.edited_at > since && screens.contains(&e.screen_id))
                .cloned()
                .collect()
        }))
    }

    async fn insert_task(&self, task: &Task) -> StoreResult<()> {
        self.write(|state| {
            if !state.screens.iter().any(|s| s.id == task.screen_id) {
                return Err(StoreError::not_found("screen", task.screen_id));
            }
            state.tasks.push(task.clone());
            Ok(())
        })?;
        self.persist().await
    }

    async fn set_task_status(
        &self,
        id: TaskId,
        status: TaskStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<Task> {
        let task = self.write(|state| {
            let row = state
                .tasks
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or_else(|| StoreError::not_found("task", id))?;
            if row.status != status {
                row.status = status;
                let updated = row.clone();
                state.task_edits.push(TaskEdit {
                    task_id: id,
                    change: TaskChange::Status(status),
                    edited_at: at,
                });
                return Ok(updated);
            }
            Ok(row.clone())
        })?;
        self.persist().await?;
        Ok(task)
    }

    async fn tasks(&self, screens: &[ScreenId]) -> StoreResult<Vec<Task>> {
        Ok(self.read(|state| {
            screens
                .iter()
                .flat_map(|screen| {
                    let mut tasks: Vec<Task> = state
                        .tasks
                        .iter()
                        .filter(|t| t.screen_id == *screen)
                        .cloned()
                        .collect();
                    tasks.sort_by_key(|t| t.position);
                    tasks
                })
                .collect()
        }))
    }

    async fn task_edits(
        &self,
        tasks: &[TaskId],
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<TaskEdit>> {
        Ok(self.read(|state| {
            state
                .task_edits
                .iter()
                .filter(|e| e.edited_at > since && tasks.contains(&e.task_id))
                .cloned()
                .collect()
        }))
    }

    async fn insert_update(&self, update: &SentUpdate) -> StoreResult<()> {
        self.write(|state| {
            state.updates.push(update.clone());
            Ok(())
        })?;
        self.persist().await
    }

    async fn latest_update(&self, project: ProjectId) -> StoreResult<Option<SentUpdate>> {
        Ok(self.read(|state| {
            state
                .updates
                .iter()
                .filter(|u| u.project_id == project)
                .max_by_key(|u| u.sent_at)
                .cloned()
        }))
    }

    async fn updates(&self, project: ProjectId) -> StoreResult<Vec<SentUpdate>> {
        let mut updates: Vec<SentUpdate> = self.read(|state| {
            state
                .updates
                .iter()
                .filter(|u| u.project_id == project)
                .cloned()
                .collect()
        });
        updates.reverse();
        updates.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
        Ok(updates)
    }

    async fn insert_user(&self, user: &UserProfile) -> StoreResult<()> {
        self.write(|state| {
            if state.users.iter().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
                return Err(StoreError::Conflict(format!(
                    "email already registered: {}",
                    user.email
                )));
            }
            state.users.push(user.clone());
            Ok(())
        })?;
        self.persist().await
    }

    async fn user(&self, id: UserId) -> StoreResult<UserProfile> {
        self.read(|state| state.users.iter().find(|u| u.id == id).cloned())
            .ok_or_else(|| StoreError::not_found("user", id))
    }

    async fn users(&self) -> StoreResult<Vec<UserProfile>> {
        Ok(self.read(|state| state.users.clone()))
    }

    async fn milestone(
        &self,
        project: ProjectId,
        kind: MilestoneKind,
    ) -> StoreResult<Option<MilestoneRecord>> {
        Ok(self.read(|state| {
            state
                .milestones
                .iter()
                .find(|m| m.project_id == project && m.milestone.kind() == kind)
                .cloned()
        }))
    }

    async fn save_milestone(&self, record: &MilestoneRecord) -> StoreResult<()> {
        self.write(|state| {
            let kind = record.milestone.kind();
            match state
                .milestones
                .iter_mut()
                .find(|m| m.project_id == record.project_id && m.milestone.kind() == kind)
            {
                Some(row) => *row = record.clone(),
                None => state.milestones.push(record.clone()),
            }
            Ok(())
        })?;
        self.persist().await
    }

    async fn milestones(&self, project: ProjectId) -> StoreResult<Vec<MilestoneRecord>> {
        let mut records: Vec<MilestoneRecord> = self.read(|state| {
            state
                .milestones
                .iter()
                .filter(|m| m.project_id == project)
                .cloned()
                .collect()
        });
        records.sort_by_key(|m| m.milestone.kind());
        Ok(records)
    }
}
