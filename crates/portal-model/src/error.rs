//! Error types shared by the portal crates

use crate::milestone::MilestoneKind;

/// A string did not name any variant of a closed enum
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {what}: '{value}'")]
pub struct UnknownVariant {
    /// Which enum was being parsed
    pub what: &'static str,
    /// The rejected input
    pub value: String,
}

impl UnknownVariant {
    /// Create error for rejected input
    pub fn new(what: &'static str, value: impl Into<String>) -> Self {
        Self {
            what,
            value: value.into(),
        }
    }
}

/// Errors applying a milestone update
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MilestoneUpdateError {
    /// Update payload targets a different milestone kind
    #[error("cannot apply {update} update to {milestone} milestone")]
    KindMismatch {
        /// Kind of the stored milestone
        milestone: MilestoneKind,
        /// Kind of the update payload
        update: MilestoneKind,
    },
}
