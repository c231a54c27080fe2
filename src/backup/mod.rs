//! Backup chains and the registry that owns them
//!
//! # Architecture
//!
//! - `Backup`: one chain of restore points with its algorithm and retention
//!   policy. Deleting a point merges it into an incremental successor so the
//!   remaining points stay restorable.
//! - `BackupManager`: a registry of independent chains keyed by id.
//! - `BackupListing`: the presentation view consumed by the CLI and exports.
//!
//! # Example
//!
//! ```rust,ignore
//! use backups::algorithm::AlgorithmKind;
//! use backups::backup::BackupManager;
//! use backups::retention::RetentionPolicy;
//!
//! let mut manager = BackupManager::new();
//! let backup = manager.create(["notes.md"], "/var/backups/notes", AlgorithmKind::SeparateStorage.build())?;
//! backup.add_files(["todo.md"], true)?;
//! backup.set_policy(RetentionPolicy::by_number(10))?;
//! backup.cleanup()?;
//! ```

mod chain;
mod listing;
mod manager;

pub use chain::{Backup, ReleaseFailure};
pub use listing::{BackupListing, RestorePointListing};
pub use manager::BackupManager;
