//! Audit entry data structures
//!
//! Defines the structure of audit log entries: which operation ran, what it
//! touched, and an optional JSON snapshot of the result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Types of operations that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// A backup was created
    Create,
    /// A restore point was added
    Snapshot,
    /// A restore point was deleted explicitly
    Delete,
    /// Retention cleanup ran
    Cleanup,
    /// A retention policy was set
    Policy,
    /// A restore point was materialized
    Restore,
    /// A backup was removed with its storage
    Remove,
    /// Storage of a deleted restore point could not be released
    Unreleased,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "CREATE"),
            Operation::Snapshot => write!(f, "SNAPSHOT"),
            Operation::Delete => write!(f, "DELETE"),
            Operation::Cleanup => write!(f, "CLEANUP"),
            Operation::Policy => write!(f, "POLICY"),
            Operation::Restore => write!(f, "RESTORE"),
            Operation::Remove => write!(f, "REMOVE"),
            Operation::Unreleased => write!(f, "UNRELEASED"),
        }
    }
}

/// Types of entities that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Backup,
    RestorePoint,
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityType::Backup => write!(f, "Backup"),
            EntityType::RestorePoint => write!(f, "RestorePoint"),
        }
    }
}

/// A single audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the operation occurred (UTC)
    pub timestamp: DateTime<Utc>,

    /// Type of operation performed
    pub operation: Operation,

    /// Type of entity affected
    pub entity_type: EntityType,

    /// ID of the affected entity (e.g. "bk-0" or "bk-0/rp-3")
    pub entity_id: String,

    /// JSON snapshot of the entity after the operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    /// Human-readable one-line summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl AuditEntry {
    /// Create a new audit entry without details
    pub fn new(operation: Operation, entity_type: EntityType, entity_id: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            operation,
            entity_type,
            entity_id: entity_id.into(),
            details: None,
            summary: None,
        }
    }

    /// Attach a JSON snapshot of the entity
    pub fn with_details<T: Serialize>(mut self, details: &T) -> Self {
        self.details = serde_json::to_value(details).ok();
        self
    }

    /// Attach a summary line
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Format the entry for human-readable output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {} {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.operation,
            self.entity_type,
            self.entity_id
        );

        if let Some(summary) = &self.summary {
            output.push_str(&format!(" ({})", summary));
        }

        output
    }
}
