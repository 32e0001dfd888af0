//! Portal Changes
//!
//! Works out what to tell a client in the next status update.
//!
//! # Flow
//!
//! ```text
//! last SentUpdate ──► previous task statuses + sent_at
//!                                   │
//! current screens/tasks + edits ────┴──► diff() ──► ChangesSummary
//!                                                        │
//!                           (after a successful send)    ▼
//!                              ChangeSnapshot::capture(current tasks, summary)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use portal_changes::{diff, ChangeSnapshot, DiffInput};
//!
//! let previous = last_update.snapshot.task_statuses;
//! let summary = diff(
//!     &DiffInput::new(&screens, &tasks, &previous, last_update.sent_at)
//!         .with_task_edits(&task_edits)
//!         .with_screen_edits(&screen_edits),
//! );
//! let next_baseline = ChangeSnapshot::capture(&tasks, summary);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod differ;
pub mod snapshot;
pub mod summary;

pub use differ::{diff, DiffInput, UNKNOWN_SCREEN};
pub use snapshot::{ChangeSnapshot, SentUpdate, TaskStatusMap};
pub use summary::{ChangesSummary, CompletedTask, NewScreen, NewTask, ReviewItem, UpdatedScreen};
