//! Persistent rows: projects, screens, tasks, their edit history and users

use crate::error::UnknownVariant;
use crate::ids::{ProjectId, ScreenId, TaskId, UserId};
use crate::status::TaskStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A client project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Row id
    pub id: ProjectId,
    /// Client who can see this project
    pub client: Option<UserId>,
    /// Display name
    pub name: String,
    /// One-line pitch shown under the name
    pub tagline: Option<String>,
    /// Longer description
    pub description: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Project {
    /// Create new project row
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ProjectId::new(),
            client: None,
            name: name.into(),
            tagline: None,
            description: description.into(),
            created_at,
        }
    }

    /// With tagline
    #[inline]
    #[must_use]
    pub fn with_tagline(mut self, tagline: Option<String>) -> Self {
        self.tagline = tagline;
        self
    }

    /// With owning client
    #[inline]
    #[must_use]
    pub fn with_client(mut self, client: UserId) -> Self {
        self.client = Some(client);
        self
    }
}

/// A named subdivision of a project, roughly one UI view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Screen {
    /// Row id
    pub id: ScreenId,
    /// Owning project
    pub project_id: ProjectId,
    /// Title
    pub title: String,
    /// Optional description
    pub description: Option<String>,
    /// Sort order within the project
    pub position: u32,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Screen {
    /// Create new screen row
    #[must_use]
    pub fn new(
        project_id: ProjectId,
        title: impl Into<String>,
        position: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ScreenId::new(),
            project_id,
            title: title.into(),
            description: None,
            position,
            created_at,
        }
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }
}

/// A unit of work belonging to a screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Row id
    pub id: TaskId,
    /// Owning screen
    pub screen_id: ScreenId,
    /// Title
    pub title: String,
    /// Optional description
    pub description: Option<String>,
    /// Current status
    pub status: TaskStatus,
    /// Sort order within the screen
    pub position: u32,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Create new task row in `not_started`
    #[must_use]
    pub fn new(
        screen_id: ScreenId,
        title: impl Into<String>,
        position: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TaskId::new(),
            screen_id,
            title: title.into(),
            description: None,
            status: TaskStatus::NotStarted,
            position,
            created_at,
        }
    }

    /// With status
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }
}

/// One field-level edit of a screen, carrying the values after the edit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenEdit {
    /// Edited screen
    pub screen_id: ScreenId,
    /// Title after the edit
    pub title: String,
    /// Description after the edit
    pub description: Option<String>,
    /// When the edit happened
    pub edited_at: DateTime<Utc>,
}

/// Field touched by a task edit, with its new value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum TaskChange {
    /// Status moved
    Status(TaskStatus),
    /// Title rewritten
    Title(String),
    /// Description rewritten or cleared
    Description(Option<String>),
}

/// One field-level edit of a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEdit {
    /// Edited task
    pub task_id: TaskId,
    /// What changed
    pub change: TaskChange,
    /// When the edit happened
    pub edited_at: DateTime<Utc>,
}

impl TaskEdit {
    /// Whether this edit moved the task to `status`
    #[inline]
    #[must_use]
    pub fn is_transition_to(&self, status: TaskStatus) -> bool {
        matches!(self.change, TaskChange::Status(s) if s == status)
    }
}

/// Portal role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Studio staff with back-office access
    Admin,
    /// Client who sees their own project
    #[default]
    Client,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UserRole::Admin => "admin",
            UserRole::Client => "client",
        })
    }
}

impl FromStr for UserRole {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "client" => Ok(UserRole::Client),
            _ => Err(UnknownVariant::new("user role", s)),
        }
    }
}

/// A portal login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Row id
    pub id: UserId,
    /// Login and notification address
    pub email: String,
    /// Name used in greetings
    pub display_name: String,
    /// Role
    pub role: UserRole,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// Create new client profile
    #[must_use]
    pub fn client(
        email: impl Into<String>,
        display_name: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: UserId::new(),
            email: email.into(),
            display_name: display_name.into(),
            role: UserRole::Client,
            created_at,
        }
    }

    /// With role
    #[inline]
    #[must_use]
    pub fn with_role(mut self, role: UserRole) -> Self {
        self.role = role;
        self
    }
}
