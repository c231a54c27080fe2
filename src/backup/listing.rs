//! Presentation view of backups
//!
//! The listing is the one shape every front end consumes: per backup its id,
//! creation time, location, size, algorithm and policy, then its restore
//! points in chronological order. Field order is part of the contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::chain::Backup;
use crate::models::{BackupId, RestorePoint, RestorePointId};

/// One backup as shown to users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupListing {
    pub id: BackupId,
    pub created_at: DateTime<Utc>,
    pub location: PathBuf,
    pub size: u64,
    pub algorithm: String,
    /// Human-readable retention policy description
    pub policy: String,
    pub restore_points: Vec<RestorePointListing>,
}

/// One restore point as shown to users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestorePointListing {
    pub id: RestorePointId,
    pub created_at: DateTime<Utc>,
    pub location: PathBuf,
    pub incremental: bool,
    pub size: u64,
    pub files: Vec<PathBuf>,
}

impl From<&RestorePoint> for RestorePointListing {
    fn from(point: &RestorePoint) -> Self {
        Self {
            id: point.id,
            created_at: point.created_at,
            location: point.location.clone(),
            incremental: point.is_incremental,
            size: point.size,
            files: point.files.iter().cloned().collect(),
        }
    }
}

impl Backup {
    /// Build the presentation view of this backup
    pub fn listing(&self) -> BackupListing {
        BackupListing {
            id: self.id(),
            created_at: self.created_at(),
            location: self.location().to_path_buf(),
            size: self.total_size(),
            algorithm: self.algorithm_name().to_string(),
            policy: self.policy().to_string(),
            restore_points: self
                .restore_points()
                .iter()
                .map(RestorePointListing::from)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::AlgorithmKind;
    use crate::retention::RetentionPolicy;

    #[test]
    fn test_listing_mirrors_chain() {
        let mut backup = Backup::create(
            BackupId::new(4),
            ["b.txt", "a.txt"],
            "/store/docs",
            AlgorithmKind::SeparateStorage.build(),
        )
        .unwrap();
        backup.add_files(["c.txt"], true).unwrap();
        backup.set_policy(RetentionPolicy::by_number(3)).unwrap();

        let listing = backup.listing();

        assert_eq!(listing.id, BackupId::new(4));
        assert_eq!(listing.size, backup.total_size());
        assert_eq!(listing.algorithm, "Separate Storage");
        assert_eq!(listing.policy, "[by number: 3]");
        assert_eq!(listing.restore_points.len(), 2);

        let first = &listing.restore_points[0];
        assert!(!first.incremental);
        assert_eq!(first.files, vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")]);
        assert!(listing.restore_points[1].incremental);
    }

    #[test]
    fn test_listing_field_order_in_json() {
        let backup = Backup::create(
            BackupId::new(0),
            ["a"],
            "/store/x",
            AlgorithmKind::CombinedStorage.build(),
        )
        .unwrap();

        let json = serde_json::to_string(&backup.listing()).unwrap();
        let positions: Vec<usize> = [
            "\"id\"",
            "\"created_at\"",
            "\"location\"",
            "\"size\"",
            "\"algorithm\"",
            "\"policy\"",
            "\"restore_points\"",
        ]
        .iter()
        .map(|key| json.find(key).unwrap())
        .collect();

        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);
    }
}
