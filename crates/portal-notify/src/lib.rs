//! Portal Notify
//!
//! Everything that ends in an email to a client:
//!
//! - **Status updates**: check what changed since the last send, mail it,
//!   store the next baseline
//! - **Milestones**: apply discovery/proposal/invoice changes and notify
//! - **Profiles**: welcome email for new users
//! - **Mailer**: the transactional mail API seam
//!
//! # Example
//!
//! ```rust,ignore
//! use portal_notify::{LogMailer, MailSettings, SendRequest, StatusUpdates};
//! use std::sync::Arc;
//!
//! # async fn example(
//! #     store: Arc<portal_store::MemoryStore>,
//! #     project_id: portal_model::ProjectId,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let updates = StatusUpdates::new(store, Arc::new(LogMailer), MailSettings::default());
//! let check = updates.check_changes(project_id).await?;
//! let sent = updates.send(&check, &SendRequest::new("client@example.com")).await?;
//! println!("sent {}", sent.email_subject);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod mailer;
pub mod milestones;
pub mod profiles;
pub mod render;
pub mod updates;

pub use error::{MailError, MilestoneError, UpdateError};
pub use mailer::{DeliveryReceipt, HttpMailer, LogMailer, MailSettings, Mailer, OutgoingEmail};
pub use milestones::{MilestoneChange, Milestones};
pub use profiles::notify_profile_created;
pub use render::{
    default_subject, escape_html, render_milestone_notice, render_welcome, RenderedEmail,
    StatusEmail,
};
pub use updates::{ChangeCheck, SendRequest, StatusUpdates};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
