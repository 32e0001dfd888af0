//! Import planning and application
//!
//! A parsed outline is turned into a plan before anything is written, so the
//! admin can preview exactly which rows will be created. Importing into an
//! existing project only adds what is missing: screens are matched by title
//! (case-insensitive, trimmed) and tasks by title within their screen.
//! Existing rows are never updated or deleted.

use crate::error::ImportError;
use crate::parser::{ParsedProject, ParsedScreen};
use chrono::{DateTime, Utc};
use portal_model::{Project, ProjectId, Screen, ScreenId, Task};
use portal_store::{PortalStore, ProjectTree};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Project the plan writes into
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImportTarget {
    /// Create a project row first
    NewProject {
        /// Project name
        name: String,
        /// Optional tagline
        tagline: Option<String>,
        /// Project description
        description: String,
    },
    /// Add rows to a project that already exists
    Existing {
        /// Project receiving the rows
        project_id: ProjectId,
    },
}

/// Screen the plan writes tasks into
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScreenTarget {
    /// Create the screen
    Create {
        /// Screen title
        title: String,
        /// Screen description
        description: Option<String>,
        /// Position after the project's existing screens
        position: u32,
    },
    /// Screen already exists
    Existing {
        /// Stored screen
        screen_id: ScreenId,
        /// Stored title
        title: String,
    },
}

impl ScreenTarget {
    /// Screen title
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            ScreenTarget::Create { title, .. } | ScreenTarget::Existing { title, .. } => title,
        }
    }
}

/// Task to create
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedTask {
    /// Task title
    pub title: String,
    /// Task description
    pub description: Option<String>,
    /// Position within the screen
    pub position: u32,
}

/// One screen and the tasks to create in it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedScreen {
    /// Screen to create or reuse
    pub target: ScreenTarget,
    /// Tasks to create in it
    pub tasks: Vec<PlannedTask>,
}

/// Rows an import will create
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportPlan {
    /// Project to write into
    pub target: ImportTarget,
    /// Screens that receive rows, in outline order
    pub screens: Vec<PlannedScreen>,
    /// Outline tasks already present in the project
    pub skipped_tasks: usize,
}

fn title_key(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Planned screen plus the task titles it already holds
struct PendingScreen {
    planned: PlannedScreen,
    known: HashSet<String>,
    next_position: u32,
}

impl PendingScreen {
    fn existing(screen: &Screen, tree: &ProjectTree) -> Self {
        let present: Vec<&Task> = tree.tasks_of(screen.id).collect();
        Self {
            planned: PlannedScreen {
                target: ScreenTarget::Existing {
                    screen_id: screen.id,
                    title: screen.title.clone(),
                },
                tasks: Vec::new(),
            },
            known: present.iter().map(|t| title_key(&t.title)).collect(),
            next_position: present.iter().map(|t| t.position + 1).max().unwrap_or(0),
        }
    }

    fn create(parsed: &ParsedScreen, position: u32) -> Self {
        Self {
            planned: PlannedScreen {
                target: ScreenTarget::Create {
                    title: parsed.title.clone(),
                    description: parsed.description.clone(),
                    position,
                },
                tasks: Vec::new(),
            },
            known: HashSet::new(),
            next_position: 0,
        }
    }
}

impl ImportPlan {
    /// Plan a brand-new project containing every screen and task
    #[must_use]
    pub fn for_new_project(parsed: &ParsedProject) -> Self {
        let screens = parsed
            .screens
            .iter()
            .enumerate()
            .map(|(i, screen)| PlannedScreen {
                target: ScreenTarget::Create {
                    title: screen.title.clone(),
                    description: screen.description.clone(),
                    position: i as u32,
                },
                tasks: screen
                    .tasks
                    .iter()
                    .enumerate()
                    .map(|(j, task)| PlannedTask {
                        title: task.title.clone(),
                        description: task.description.clone(),
                        position: j as u32,
                    })
                    .collect(),
            })
            .collect();

        Self {
            target: ImportTarget::NewProject {
                name: parsed.name.clone(),
                tagline: parsed.tagline.clone(),
                description: parsed.description.clone(),
            },
            screens,
            skipped_tasks: 0,
        }
    }

    /// Plan the rows missing from an existing project
    ///
    /// A `##` title that repeats in the outline (or matches a stored screen)
    /// feeds one planned screen; its tasks are deduplicated by title across
    /// every section with that title.
    #[must_use]
    pub fn against_existing(
        parsed: &ParsedProject,
        project_id: ProjectId,
        existing: &ProjectTree,
    ) -> Self {
        let mut next_screen_position = existing
            .screens
            .iter()
            .map(|s| s.position + 1)
            .max()
            .unwrap_or(0);
        let mut skipped_tasks = 0;
        let mut pending: Vec<PendingScreen> = Vec::new();
        let mut by_title: HashMap<String, usize> = HashMap::new();

        for parsed_screen in &parsed.screens {
            let key = title_key(&parsed_screen.title);
            let index = match by_title.get(&key) {
                Some(&index) => index,
                None => {
                    let entry = match existing.screens.iter().find(|s| title_key(&s.title) == key) {
                        Some(screen) => PendingScreen::existing(screen, existing),
                        None => {
                            let position = next_screen_position;
                            next_screen_position += 1;
                            PendingScreen::create(parsed_screen, position)
                        }
                    };
                    pending.push(entry);
                    by_title.insert(key, pending.len() - 1);
                    pending.len() - 1
                }
            };

            let entry = &mut pending[index];
            for task in &parsed_screen.tasks {
                if !entry.known.insert(title_key(&task.title)) {
                    skipped_tasks += 1;
                    continue;
                }
                entry.planned.tasks.push(PlannedTask {
                    title: task.title.clone(),
                    description: task.description.clone(),
                    position: entry.next_position,
                });
                entry.next_position += 1;
            }
        }

        let screens = pending
            .into_iter()
            .map(|entry| entry.planned)
            .filter(|planned| {
                matches!(planned.target, ScreenTarget::Create { .. }) || !planned.tasks.is_empty()
            })
            .collect();

        Self {
            target: ImportTarget::Existing { project_id },
            screens,
            skipped_tasks,
        }
    }

    /// Screens this plan creates
    #[must_use]
    pub fn screens_to_create(&self) -> usize {
        self.screens
            .iter()
            .filter(|s| matches!(s.target, ScreenTarget::Create { .. }))
            .count()
    }

    /// Tasks this plan creates
    #[must_use]
    pub fn tasks_to_create(&self) -> usize {
        self.screens.iter().map(|s| s.tasks.len()).sum()
    }

    /// True when applying the plan writes nothing
    #[must_use]
    pub fn is_noop(&self) -> bool {
        matches!(self.target, ImportTarget::Existing { .. }) && self.screens.is_empty()
    }
}

/// Outcome of an applied plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Project written into
    pub project_id: ProjectId,
    /// Whether the project row was created
    pub project_created: bool,
    /// Screens inserted
    pub screens_created: usize,
    /// Tasks inserted
    pub tasks_created: usize,
    /// Outline tasks that were already present
    pub tasks_skipped: usize,
}

/// Write a plan to the store, one row at a time
///
/// # Errors
/// `ImportError::Store` on the first failed write. Rows written before the
/// failure stay in the store.
pub async fn apply<S: PortalStore + ?Sized>(
    store: &S,
    plan: &ImportPlan,
    now: DateTime<Utc>,
) -> Result<ImportReport, ImportError> {
    let (project_id, project_created) = match &plan.target {
        ImportTarget::NewProject {
            name,
            tagline,
            description,
        } => {
            let project = Project::new(name.clone(), description.clone(), now)
                .with_tagline(tagline.clone());
            store.insert_project(&project).await?;
            tracing::info!(project = %project.id, name = %project.name, "created project");
            (project.id, true)
        }
        ImportTarget::Existing { project_id } => (*project_id, false),
    };

    let mut report = ImportReport {
        project_id,
        project_created,
        screens_created: 0,
        tasks_created: 0,
        tasks_skipped: plan.skipped_tasks,
    };

    for planned in &plan.screens {
        let screen_id = match &planned.target {
            ScreenTarget::Create {
                title,
                description,
                position,
            } => {
                let screen = Screen::new(project_id, title.clone(), *position, now)
                    .with_description(description.clone());
                store.insert_screen(&screen).await?;
                report.screens_created += 1;
                screen.id
            }
            ScreenTarget::Existing { screen_id, .. } => *screen_id,
        };

        for planned_task in &planned.tasks {
            let mut task =
                Task::new(screen_id, planned_task.title.clone(), planned_task.position, now);
            task.description = planned_task.description.clone();
            store.insert_task(&task).await?;
            report.tasks_created += 1;
        }
    }

    tracing::info!(
        project = %report.project_id,
        screens = report.screens_created,
        tasks = report.tasks_created,
        skipped = report.tasks_skipped,
        "import applied"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::MarkdownProjectParser;
    use pretty_assertions::assert_eq;

    fn outline(text: &str) -> ParsedProject {
        MarkdownProjectParser::new().parse(text).unwrap()
    }

    #[test]
    fn new_project_plan_keeps_positions() {
        let parsed = outline("# P\n## A\n- [ ] a1\n- [ ] a2\n## B\n- [ ] b1\n");

        let plan = ImportPlan::for_new_project(&parsed);

        assert_eq!(plan.screens_to_create(), 2);
        assert_eq!(plan.tasks_to_create(), 3);
        assert_eq!(
            plan.screens[1].target,
            ScreenTarget::Create {
                title: "B".into(),
                description: None,
                position: 1,
            }
        );
        assert_eq!(plan.screens[0].tasks[1].position, 1);
    }

    #[test]
    fn existing_project_only_gains_missing_rows() {
        let now = Utc::now();
        let project = ProjectId::new();
        let home = Screen::new(project, "Home", 0, now);
        let tree = ProjectTree {
            tasks: vec![Task::new(home.id, "Hero banner", 4, now)],
            screens: vec![home.clone()],
        };
        let parsed = outline(
            "# P\n## home \n- [ ] hero banner\n- [ ] Footer\n## Profile\n- [ ] Avatar\n",
        );

        let plan = ImportPlan::against_existing(&parsed, project, &tree);

        assert_eq!(plan.skipped_tasks, 1);
        assert_eq!(
            plan.screens,
            vec![
                PlannedScreen {
                    target: ScreenTarget::Existing {
                        screen_id: home.id,
                        title: "Home".into(),
                    },
                    tasks: vec![PlannedTask {
                        title: "Footer".into(),
                        description: None,
                        position: 5,
                    }],
                },
                PlannedScreen {
                    target: ScreenTarget::Create {
                        title: "Profile".into(),
                        description: None,
                        position: 1,
                    },
                    tasks: vec![PlannedTask {
                        title: "Avatar".into(),
                        description: None,
                        position: 0,
                    }],
                },
            ]
        );
    }

    #[test]
    fn reimporting_same_outline_is_noop() {
        let now = Utc::now();
        let project = ProjectId::new();
        let a = Screen::new(project, "A", 0, now);
        let tree = ProjectTree {
            tasks: vec![Task::new(a.id, "a1", 0, now)],
            screens: vec![a],
        };

        let plan = ImportPlan::against_existing(&outline("# P\n## A\n- [ ] a1\n"), project, &tree);

        assert!(plan.is_noop());
        assert_eq!(plan.skipped_tasks, 1);
    }

    #[test]
    fn duplicate_titles_within_outline_are_collapsed() {
        let now = Utc::now();
        let project = ProjectId::new();
        let a = Screen::new(project, "A", 0, now);
        let tree = ProjectTree {
            tasks: Vec::new(),
            screens: vec![a],
        };

        let parsed = outline("# P\n## A\n- [ ] x\n- [ ] X\n");

        let plan = ImportPlan::against_existing(&parsed, project, &tree);

        assert_eq!(plan.tasks_to_create(), 1);
        assert_eq!(plan.skipped_tasks, 1);
    }

    #[test]
    fn repeated_screen_headings_share_one_planned_screen() {
        let now = Utc::now();
        let project = ProjectId::new();
        let a = Screen::new(project, "A", 0, now);
        let tree = ProjectTree {
            tasks: vec![Task::new(a.id, "a0", 0, now)],
            screens: vec![a.clone()],
        };
        let parsed = outline(
            "# P\n## A\n- [ ] x\n## A\n- [ ] x\n## B\n- [ ] y\n## b\n- [ ] z\n- [ ] Y\n",
        );

        let plan = ImportPlan::against_existing(&parsed, project, &tree);

        assert_eq!(plan.skipped_tasks, 2);
        assert_eq!(
            plan.screens,
            vec![
                PlannedScreen {
                    target: ScreenTarget::Existing {
                        screen_id: a.id,
                        title: "A".into(),
                    },
                    tasks: vec![PlannedTask {
                        title: "x".into(),
                        description: None,
                        position: 1,
                    }],
                },
                PlannedScreen {
                    target: ScreenTarget::Create {
                        title: "B".into(),
                        description: None,
                        position: 1,
                    },
                    tasks: vec![
                        PlannedTask {
                            title: "y".into(),
                            description: None,
                            position: 0,
                        },
                        PlannedTask {
                            title: "z".into(),
                            description: None,
                            position: 1,
                        },
                    ],
                },
            ]
        );
    }
}
