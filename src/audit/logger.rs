//! Append-only audit log
//!
//! Each entry is one JSON line (JSONL), flushed as soon as it is written.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::error::{BackupError, BackupResult};

use super::entry::AuditEntry;

/// Writes audit entries to the audit log file
#[derive(Debug, Clone)]
pub struct AuditLogger {
    log_path: PathBuf,
}

impl AuditLogger {
    /// Create a logger that appends to `log_path`
    pub fn new(log_path: PathBuf) -> Self {
        Self { log_path }
    }

    /// Append one entry and flush
    pub fn log(&self, entry: &AuditEntry) -> BackupResult<()> {
        let json = serde_json::to_string(entry)
            .map_err(|e| BackupError::Json(format!("Failed to serialize audit entry: {}", e)))?;

        if let Some(parent) = self.log_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                BackupError::Io(format!("Failed to create audit log directory: {}", e))
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| BackupError::Io(format!("Failed to open audit log: {}", e)))?;

        writeln!(file, "{}", json)
            .and_then(|_| file.flush())
            .map_err(|e| BackupError::Io(format!("Failed to write audit entry: {}", e)))
    }

    /// Read every entry, oldest first
    pub fn read_all(&self) -> BackupResult<Vec<AuditEntry>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.log_path)
            .map_err(|e| BackupError::Io(format!("Failed to open audit log: {}", e)))?;

        let mut entries = Vec::new();
        for (line_num, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| {
                BackupError::Io(format!("Failed to read audit log line {}: {}", line_num + 1, e))
            })?;

            if line.trim().is_empty() {
                continue;
            }

            let entry: AuditEntry = serde_json::from_str(&line).map_err(|e| {
                BackupError::Json(format!(
                    "Failed to parse audit entry at line {}: {}",
                    line_num + 1,
                    e
                ))
            })?;
            entries.push(entry);
        }

        Ok(entries)
    }

    /// Read the most recent `count` entries, oldest first
    pub fn read_recent(&self, count: usize) -> BackupResult<Vec<AuditEntry>> {
        let mut entries = self.read_all()?;
        let start = entries.len().saturating_sub(count);
        Ok(entries.split_off(start))
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::entry::{EntityType, Operation};
    use tempfile::TempDir;

    fn create_test_logger() -> (AuditLogger, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let logger = AuditLogger::new(temp_dir.path().join("logs").join("audit.log"));
        (logger, temp_dir)
    }

    #[test]
    fn test_log_and_read() {
        let (logger, _temp) = create_test_logger();
        let entry = AuditEntry::new(Operation::Create, EntityType::Backup, "bk-0");

        logger.log(&entry).unwrap();

        let entries = logger.read_all().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].operation, Operation::Create);
        assert_eq!(entries[0].entity_id, "bk-0");
    }

    #[test]
    fn test_read_recent() {
        let (logger, _temp) = create_test_logger();
        for i in 0..6 {
            let entry = AuditEntry::new(
                Operation::Snapshot,
                EntityType::RestorePoint,
                format!("bk-0/rp-{}", i),
            );
            logger.log(&entry).unwrap();
        }

        let recent = logger.read_recent(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].entity_id, "bk-0/rp-4");
        assert_eq!(recent[1].entity_id, "bk-0/rp-5");
    }

    #[test]
    fn test_empty_log() {
        let (logger, _temp) = create_test_logger();
        assert!(logger.read_all().unwrap().is_empty());
        assert!(logger.read_recent(5).unwrap().is_empty());
    }

    #[test]
    fn test_survives_reopen() {
        let (logger, _temp) = create_test_logger();
        logger
            .log(&AuditEntry::new(Operation::Remove, EntityType::Backup, "bk-1"))
            .unwrap();

        let reopened = AuditLogger::new(logger.path().to_path_buf());
        assert_eq!(reopened.read_all().unwrap().len(), 1);
    }
}
