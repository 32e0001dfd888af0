//! Error types for notifications
//!
//! - Mail delivery failures
//! - Status update workflow failures
//! - Milestone update failures

use portal_model::{MilestoneUpdateError, UpdateId};
use portal_store::StoreError;

/// Errors from the transactional mail API
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// API answered with a non-success status
    #[error("mail api rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// Request never got a response
    #[error("mail transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Mailer is not usable as configured
    #[error("mail configuration error: {0}")]
    Config(String),
}

impl MailError {
    /// Create rejection error
    pub fn rejected(status: u16, body: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            body: body.into(),
        }
    }
}

/// Errors checking for or sending a status update
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    /// Reading rows or recording the update failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Email was not delivered; nothing was recorded
    #[error("mail error: {0}")]
    Mail(#[from] MailError),

    /// Another update was sent after the changes were checked
    #[error("changes are stale: checked against {expected:?}, latest update is {found:?}")]
    StaleBaseline {
        /// Baseline the check was computed against
        expected: Option<UpdateId>,
        /// Latest update at send time
        found: Option<UpdateId>,
    },
}

impl UpdateError {
    /// Check if re-running "check changes" could fix the error
    #[inline]
    #[must_use]
    pub fn needs_recheck(&self) -> bool {
        matches!(self, Self::StaleBaseline { .. })
    }
}

/// Errors updating a milestone
#[derive(Debug, thiserror::Error)]
pub enum MilestoneError {
    /// Payload does not fit the milestone
    #[error(transparent)]
    Update(#[from] MilestoneUpdateError),

    /// Reading or saving the milestone failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_display() {
        let err = MailError::rejected(422, "invalid from address");
        assert_eq!(err.to_string(), "mail api rejected message (422): invalid from address");
    }

    #[test]
    fn stale_baseline_needs_recheck() {
        let err = UpdateError::StaleBaseline {
            expected: None,
            found: Some(UpdateId::new()),
        };
        assert!(err.needs_recheck());
        assert!(!UpdateError::from(MailError::Config("no key".into())).needs_recheck());
    }
}
