//! Audit logging for backup operations
//!
//! Every successful command that changes a backup is recorded in an
//! append-only, line-delimited JSON log.
//!
//! # Example
//!
//! ```rust,ignore
//! use backups::audit::{AuditEntry, AuditLogger, EntityType, Operation};
//!
//! let logger = AuditLogger::new(paths.audit_log());
//! logger.log(
//!     &AuditEntry::new(Operation::Cleanup, EntityType::Backup, "bk-0")
//!         .with_summary("deleted 3 restore points"),
//! )?;
//! ```

mod entry;
mod logger;

pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
