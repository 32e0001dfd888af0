//! Portal Store
//!
//! The boundary between portal services and the database holding projects,
//! screens, tasks, edit history, users, milestones and sent updates.
//!
//! # Example
//!
//! ```rust,ignore
//! use portal_store::{load_tree, MemoryStore, PortalStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::open("portal.json").await?;
//! let tree = load_tree(&store, project_id).await?;
//! println!("{} screens, {} tasks", tree.screens.len(), tree.tasks.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod memory;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use store::{load_tree, PortalStore, ProjectTree};

#[cfg(feature = "mock")]
pub use store::MockPortalStore;
