//! Portal Import
//!
//! Turns a markdown project outline into project, screen and task rows.
//!
//! # Flow
//!
//! ```text
//! outline.md → MarkdownProjectParser → ParsedProject (preview)
//!                                         │
//!               ImportPlan::for_new_project / ::against_existing
//!                                         │
//!                                   apply(store) → ImportReport
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use portal_import::{import_outline, MarkdownProjectParser};
//!
//! # async fn example(
//! #     store: &impl portal_store::PortalStore,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let parser = MarkdownProjectParser::new();
//! let outline = "# Pantry\n## Lists\n- [ ] Create list\n";
//! let report = import_outline(store, &parser, outline, None, chrono::Utc::now()).await?;
//! println!("created {} tasks", report.tasks_created);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod parser;
pub mod plan;

pub use error::{ImportError, ParseError};
pub use parser::{
    MarkdownProjectParser, ParsedProject, ParsedScreen, ParsedTask, DEFAULT_DESCRIPTION,
};
pub use plan::{
    apply, ImportPlan, ImportReport, ImportTarget, PlannedScreen, PlannedTask, ScreenTarget,
};

use chrono::{DateTime, Utc};
use portal_model::ProjectId;
use portal_store::PortalStore;

/// Build the plan for an outline, reading the existing project when given
///
/// # Errors
/// - `ImportError::Parse` if the outline has no project name
/// - `ImportError::Store` if the existing project cannot be read
pub async fn plan_outline<S: PortalStore + ?Sized>(
    store: &S,
    parser: &MarkdownProjectParser,
    content: &str,
    into: Option<ProjectId>,
) -> Result<ImportPlan, ImportError> {
    let parsed = parser.parse(content)?;
    match into {
        None => Ok(ImportPlan::for_new_project(&parsed)),
        Some(project_id) => {
            store.project(project_id).await?;
            let tree = portal_store::load_tree(store, project_id).await?;
            Ok(ImportPlan::against_existing(&parsed, project_id, &tree))
        }
    }
}

/// Parse, plan and apply an outline in one go
///
/// # Errors
/// See [`plan_outline`] and [`apply`].
pub async fn import_outline<S: PortalStore + ?Sized>(
    store: &S,
    parser: &MarkdownProjectParser,
    content: &str,
    into: Option<ProjectId>,
    now: DateTime<Utc>,
) -> Result<ImportReport, ImportError> {
    let plan = plan_outline(store, parser, content, into).await?;
    apply(store, &plan, now).await
}
