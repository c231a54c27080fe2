//! JSON Export functionality
//!
//! Exports the registry listing to JSON with schema versioning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Write;

use crate::backup::BackupListing;
use crate::error::{BackupError, BackupResult};

/// Current export schema version
pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Full registry export structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupExport {
    /// Schema version for compatibility checking
    pub schema_version: String,

    /// Export timestamp
    pub exported_at: DateTime<Utc>,

    /// Application version that created the export
    pub app_version: String,

    /// Every backup, in creation order
    pub backups: Vec<BackupListing>,

    pub metadata: ExportMetadata,
}

/// Summary figures for the export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub backup_count: usize,
    pub restore_point_count: usize,
    /// Sum of every backup's total size
    pub total_size: u64,
}

impl BackupExport {
    /// Build an export from listings taken at `exported_at`
    pub fn from_listings(backups: Vec<BackupListing>, exported_at: DateTime<Utc>) -> Self {
        let metadata = ExportMetadata {
            backup_count: backups.len(),
            restore_point_count: backups.iter().map(|b| b.restore_points.len()).sum(),
            total_size: backups.iter().map(|b| b.size).sum(),
        };

        Self {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            exported_at,
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            backups,
            metadata,
        }
    }

    /// Check the export is internally consistent
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version != EXPORT_SCHEMA_VERSION {
            return Err(format!(
                "Schema version mismatch: expected {}, got {}",
                EXPORT_SCHEMA_VERSION, self.schema_version
            ));
        }

        let mut backup_ids = HashSet::new();
        for backup in &self.backups {
            if !backup_ids.insert(backup.id) {
                return Err(format!("Duplicate backup id {}", backup.id));
            }

            let point_sum: u64 = backup.restore_points.iter().map(|p| p.size).sum();
            if point_sum != backup.size {
                return Err(format!(
                    "Backup {} size {} does not match its restore points ({})",
                    backup.id, backup.size, point_sum
                ));
            }

            if backup.restore_points.first().is_some_and(|p| p.incremental) {
                return Err(format!(
                    "Backup {} starts with an incremental restore point",
                    backup.id
                ));
            }

            let ids_ascending = backup.restore_points.windows(2).all(|w| w[0].id < w[1].id);
            if !ids_ascending {
                return Err(format!(
                    "Backup {} restore points are out of order",
                    backup.id
                ));
            }
        }

        Ok(())
    }
}

/// Export the listings to JSON
pub fn export_json<W: Write>(
    backups: Vec<BackupListing>,
    writer: &mut W,
    pretty: bool,
) -> BackupResult<()> {
    let export = BackupExport::from_listings(backups, Utc::now());

    if pretty {
        serde_json::to_writer_pretty(writer, &export)
    } else {
        serde_json::to_writer(writer, &export)
    }
    .map_err(|e| BackupError::Export(e.to_string()))?;

    Ok(())
}

/// Read back a JSON export (for verification)
pub fn import_from_json(json_str: &str) -> BackupResult<BackupExport> {
    let export: BackupExport =
        serde_json::from_str(json_str).map_err(|e| BackupError::Export(e.to_string()))?;

    export.validate().map_err(BackupError::Export)?;

    Ok(export)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::AlgorithmKind;
    use crate::backup::BackupManager;
    use crate::retention::RetentionPolicy;

    fn sample_manager() -> BackupManager {
        let mut manager = BackupManager::new();
        let backup = manager
            .create(
                ["a.txt", "b.txt"],
                "/store/docs",
                AlgorithmKind::SeparateStorage.build(),
            )
            .unwrap();
        backup.add_files(["c.txt"], true).unwrap();
        backup.set_policy(RetentionPolicy::by_number(5)).unwrap();
        manager
            .create(["photo.png"], "/store/pics", AlgorithmKind::CombinedStorage.build())
            .unwrap();
        manager
    }

    #[test]
    fn test_export_metadata() {
        let manager = sample_manager();
        let export = BackupExport::from_listings(manager.listing(), Utc::now());

        assert_eq!(export.schema_version, EXPORT_SCHEMA_VERSION);
        assert_eq!(export.metadata.backup_count, 2);
        assert_eq!(export.metadata.restore_point_count, 3);
        assert_eq!(
            export.metadata.total_size,
            manager.backups().iter().map(|b| b.total_size()).sum::<u64>()
        );
        assert!(export.validate().is_ok());
    }

    #[test]
    fn test_json_roundtrip() {
        let manager = sample_manager();

        let mut output = Vec::new();
        export_json(manager.listing(), &mut output, true).unwrap();
        let json_string = String::from_utf8(output).unwrap();

        let imported = import_from_json(&json_string).unwrap();
        assert_eq!(imported.backups, manager.listing());
        assert!(json_string.contains("\"policy\": \"[by number: 5]\""));
    }

    #[test]
    fn test_validate_rejects_size_mismatch() {
        let manager = sample_manager();
        let mut export = BackupExport::from_listings(manager.listing(), Utc::now());
        export.backups[0].size += 1;

        let err = export.validate().unwrap_err();
        assert!(err.contains("does not match"));
    }

    #[test]
    fn test_validate_rejects_schema_mismatch() {
        let mut export = BackupExport::from_listings(Vec::new(), Utc::now());
        export.schema_version = "0.1.0".to_string();

        assert!(export.validate().is_err());
    }
}
