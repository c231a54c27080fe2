//! Path management for backup-chain
//!
//! ## Path Resolution Order
//!
//! 1. `BACKUP_CHAIN_DATA_DIR` environment variable (if set)
//! 2. Unix (Linux/macOS): `$XDG_CONFIG_HOME/backup-chain` or `~/.config/backup-chain`
//! 3. Windows: `%APPDATA%\backup-chain`

use std::path::PathBuf;

use crate::error::BackupError;

/// Environment variable overriding the base directory
pub const DATA_DIR_ENV: &str = "BACKUP_CHAIN_DATA_DIR";

/// Manages all paths used by backup-chain
#[derive(Debug, Clone)]
pub struct BackupPaths {
    base_dir: PathBuf,
}

impl BackupPaths {
    /// Resolve the base directory from the environment
    ///
    /// # Errors
    ///
    /// Returns an error if no home or application data directory is known.
    pub fn new() -> Result<Self, BackupError> {
        let base_dir = match std::env::var(DATA_DIR_ENV) {
            Ok(custom) => PathBuf::from(custom),
            Err(_) => resolve_default_path()?,
        };

        Ok(Self { base_dir })
    }

    /// Use a fixed base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Path to the audit log
    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    /// Create the base directory if it is missing
    pub fn ensure_directories(&self) -> Result<(), BackupError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| BackupError::Io(format!("Failed to create base directory: {}", e)))
    }
}

#[cfg(not(windows))]
fn resolve_default_path() -> Result<PathBuf, BackupError> {
    let config_base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) => PathBuf::from(xdg),
        Err(_) => {
            let home = std::env::var("HOME")
                .map_err(|_| BackupError::Config("HOME environment variable not set".into()))?;
            PathBuf::from(home).join(".config")
        }
    };
    Ok(config_base.join("backup-chain"))
}

#[cfg(windows)]
fn resolve_default_path() -> Result<PathBuf, BackupError> {
    let appdata = std::env::var("APPDATA")
        .map_err(|_| BackupError::Config("Could not determine APPDATA directory".into()))?;
    Ok(PathBuf::from(appdata).join("backup-chain"))
}
