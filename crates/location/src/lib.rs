//! Backup locations and command execution
//!
//! This crate provides:
//! - `Location`: a local or `ssh` reachable directory holding backups
//! - `CommandContext`: where and how external commands run (ssh, sudo)
//! - Existence and permission checks with actionable errors
//! - Listing of candidate backups, optionally with modification times
//! - `DeletionPool`: concurrent deletions, serialized per disk

pub mod context;
pub mod error;
pub mod location;
pub mod pool;

// Re-exports
pub use context::CommandContext;
pub use error::{LocationError, Result};
pub use location::{AffinityKey, Location};
pub use pool::{Deletion, DeletionFailure, DeletionPool, DeletionReport};
