//! Portal Admin
//!
//! The studio-side command line: import outlines, review what changed,
//! send status updates, move milestones and manage users.
//!
//! # Example
//!
//! ```rust,ignore
//! use portal_admin::{commands, Portal, PortalConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = PortalConfig::load(None)?;
//! let portal = Portal::open(&config).await?;
//! print!("{}", commands::projects(&portal).await?);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod search;

pub use app::Portal;
pub use config::{ConfigError, PortalConfig};
pub use search::{rank, Ranked, Searchable};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
