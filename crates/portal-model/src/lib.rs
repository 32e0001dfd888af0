//! Portal Model
//!
//! Rows and enums shared by every portal crate:
//! - Typed row identifiers
//! - Projects, screens, tasks and their field-level edit history
//! - User profiles and roles
//! - Milestones as a closed tagged union

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod entity;
pub mod error;
pub mod ids;
pub mod milestone;
pub mod status;

pub use entity::{Project, Screen, ScreenEdit, Task, TaskChange, TaskEdit, UserProfile, UserRole};
pub use error::{MilestoneUpdateError, UnknownVariant};
pub use ids::{ProjectId, ScreenId, TaskId, UpdateId, UserId};
pub use milestone::{
    Discovery, DiscoveryStatus, DiscoveryUpdate, Invoice, InvoiceStatus, InvoiceUpdate, Milestone,
    MilestoneKind, MilestoneRecord, MilestoneUpdate, Proposal, ProposalStatus, ProposalUpdate,
};
pub use status::TaskStatus;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
