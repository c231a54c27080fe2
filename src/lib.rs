//! backup-chain - restore-point chains with pluggable retention policies
//!
//! A backup tracks a set of files and stores snapshots of them as a chain of
//! restore points. Each point is full or incremental; deleting a point merges
//! it into an incremental successor so the chain stays restorable. A
//! retention policy decides which leading points `cleanup` removes.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `models`: Identifiers and the restore point record
//! - `algorithm`: The storage algorithm boundary and its bundled implementations
//! - `retention`: Retention policies and hybrid combination rules
//! - `backup`: The chain itself, its registry, and the listing view
//! - `clock`: Time source for restore point timestamps
//! - `display` / `export`: Text, JSON and YAML renderings of the listing
//! - `cli`: Shell grammar, session and loops behind the `backups` binary
//! - `config`: Path resolution and user settings
//! - `audit`: Audit logging system
//! - `error`: Custom error types
//!
//! # Example
//!
//! ```rust,ignore
//! use backups::algorithm::AlgorithmKind;
//! use backups::backup::BackupManager;
//! use backups::retention::RetentionPolicy;
//!
//! let mut manager = BackupManager::new();
//! let backup = manager.create(["a.txt", "b.txt"], "/store/docs", AlgorithmKind::SeparateStorage.build())?;
//! backup.add_files(["c.txt"], true)?;
//! backup.set_policy(RetentionPolicy::by_number(1))?;
//! backup.cleanup()?;
//! ```

pub mod algorithm;
pub mod audit;
pub mod backup;
pub mod cli;
pub mod clock;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod models;
pub mod retention;

pub use error::{BackupError, BackupResult};
