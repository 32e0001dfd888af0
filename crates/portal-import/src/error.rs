//! Error types for project import
//!
//! - Parse failures (markdown → tree)
//! - Store failures while writing the tree

use portal_store::StoreError;

/// Errors parsing a project outline
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The document has no `# ` heading to name the project
    #[error("no project name found: the outline needs a '# Project name' line")]
    MissingProjectName,
}

/// Errors importing an outline into the store
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// Outline could not be parsed; nothing was written
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// A write failed; rows written before it are kept
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
