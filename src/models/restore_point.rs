//! Restore point model
//!
//! A restore point is one timestamped snapshot of a chain's tracked file set,
//! stored either in full or as a delta against its immediate predecessor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::ids::RestorePointId;

/// A single snapshot in a backup chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestorePoint {
    /// Unique within the owning chain, never reused
    pub id: RestorePointId,

    /// When the snapshot was taken; chains are ordered by this
    pub created_at: DateTime<Utc>,

    /// Where the algorithm keeps this point's data
    pub location: PathBuf,

    /// Whether this point only stores a delta against its predecessor
    pub is_incremental: bool,

    /// Source paths captured by this point
    pub files: BTreeSet<PathBuf>,

    /// Size in bytes, as last reported by the algorithm
    pub size: u64,
}

impl RestorePoint {
    /// Create a new restore point
    pub fn new(
        id: RestorePointId,
        created_at: DateTime<Utc>,
        location: PathBuf,
        is_incremental: bool,
        files: BTreeSet<PathBuf>,
        size: u64,
    ) -> Self {
        Self {
            id,
            created_at,
            location,
            is_incremental,
            files,
            size,
        }
    }

    /// Whether this point can be restored without any predecessor
    pub fn is_full(&self) -> bool {
        !self.is_incremental
    }

    /// Check whether a path is captured by this point
    pub fn tracks(&self, path: impl AsRef<Path>) -> bool {
        self.files.contains(path.as_ref())
    }

    /// Number of tracked files
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_point() -> RestorePoint {
        RestorePoint::new(
            RestorePointId::new(0),
            Utc::now(),
            PathBuf::from("/backups/docs/0"),
            false,
            ["a.txt", "b.txt"].iter().map(PathBuf::from).collect(),
            2048,
        )
    }

    #[test]
    fn test_new_restore_point() {
        let point = sample_point();
        assert!(point.is_full());
        assert_eq!(point.file_count(), 2);
        assert!(point.tracks("a.txt"));
        assert!(!point.tracks("c.txt"));
    }

    #[test]
    fn test_serialization() {
        let point = sample_point();
        let json = serde_json::to_string(&point).unwrap();
        let deserialized: RestorePoint = serde_json::from_str(&json).unwrap();
        assert_eq!(point, deserialized);
    }
}
