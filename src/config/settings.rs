//! User settings for backup-chain
//!
//! Manages defaults for new backups and restore points, the retention policy
//! attached to new backups, and whether cleanup runs automatically.

use serde::{Deserialize, Serialize};

use super::paths::BackupPaths;
use crate::error::BackupError;
use crate::retention::RetentionPolicy;

/// User settings for backup-chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Whether new restore points are incremental unless told otherwise
    #[serde(default = "default_true")]
    pub default_incremental: bool,

    /// Retention policy attached to newly created backups
    #[serde(default)]
    pub default_policy: RetentionPolicy,

    /// Run retention cleanup after every command that adds restore points
    #[serde(default)]
    pub auto_cleanup: bool,

    /// Record operations in the audit log
    #[serde(default = "default_true")]
    pub audit_enabled: bool,
}

fn default_schema_version() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            default_incremental: true,
            default_policy: RetentionPolicy::default(),
            auto_cleanup: false,
            audit_enabled: true,
        }
    }
}

impl Settings {
    /// Load settings from disk, or fall back to defaults if the file is missing
    pub fn load_or_create(paths: &BackupPaths) -> Result<Self, BackupError> {
        let settings_path = paths.settings_file();

        if !settings_path.exists() {
            // Don't save yet - let caller decide when to persist
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(&settings_path)
            .map_err(|e| BackupError::Io(format!("Failed to read settings file: {}", e)))?;

        let settings: Settings = serde_json::from_str(&contents)
            .map_err(|e| BackupError::Config(format!("Failed to parse settings file: {}", e)))?;

        settings
            .default_policy
            .validate()
            .map_err(|e| BackupError::Config(format!("Invalid default policy: {}", e)))?;

        Ok(settings)
    }

    /// Save settings to disk
    pub fn save(&self, paths: &BackupPaths) -> Result<(), BackupError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| BackupError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| BackupError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }
}
