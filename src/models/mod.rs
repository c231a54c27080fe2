//! Core data models for backup-chain
//!
//! This module contains the data structures shared by chains, retention
//! policies and the presentation layer.

pub mod ids;
pub mod restore_point;

pub use ids::{BackupId, RestorePointId};
pub use restore_point::RestorePoint;
