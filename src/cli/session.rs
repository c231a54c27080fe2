//! Shell session
//!
//! Holds the in-memory registry for the lifetime of one `shell` or `run`
//! invocation and executes parsed commands against it.

use serde_json::json;
use std::io::Write;

use super::commands::{ListFormat, ShellCommand};
use crate::audit::{AuditEntry, AuditLogger, EntityType, Operation};
use crate::backup::{Backup, BackupManager};
use crate::config::Settings;
use crate::display::format_backup_list;
use crate::error::{BackupError, BackupResult};
use crate::export::{export_json, export_yaml};
use crate::models::{BackupId, RestorePointId};

/// What the shell loop should do after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Registry plus the settings and audit log it runs with
#[derive(Debug)]
pub struct Session {
    manager: BackupManager,
    settings: Settings,
    audit: Option<AuditLogger>,
}

fn write_err(e: std::io::Error) -> BackupError {
    BackupError::Io(format!("Failed to write output: {}", e))
}

fn point_entity(backup: BackupId, point: RestorePointId) -> String {
    format!("{}/{}", backup, point)
}

impl Session {
    /// Start an empty session
    ///
    /// The audit log is only written when `settings.audit_enabled` is set.
    pub fn new(settings: Settings, audit: Option<AuditLogger>) -> BackupResult<Self> {
        let manager = BackupManager::with_default_policy(settings.default_policy.clone())?;
        let audit = audit.filter(|_| settings.audit_enabled);
        Ok(Self {
            manager,
            settings,
            audit,
        })
    }

    pub fn manager(&self) -> &BackupManager {
        &self.manager
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Execute one command, writing any report to `out`
    ///
    /// Storage the command deleted but could not release is audited even
    /// when the command itself fails.
    pub fn execute<W: Write>(&mut self, command: ShellCommand, out: &mut W) -> BackupResult<Flow> {
        let target = command.backup_id();
        let result = self.dispatch(command, out);
        let recorded = match target {
            Some(id) => self.record_release_failures(id),
            None => Ok(()),
        };
        let flow = result?;
        recorded?;
        Ok(flow)
    }

    fn dispatch<W: Write>(&mut self, command: ShellCommand, out: &mut W) -> BackupResult<Flow> {
        let auto_cleanup = self.settings.auto_cleanup && command.is_mutating();

        let touched = match command {
            ShellCommand::Exit => return Ok(Flow::Exit),

            ShellCommand::List { format } => {
                self.list(format, out)?;
                None
            }

            ShellCommand::New {
                algorithm,
                location,
                files,
            } => {
                let backup = self.manager.create(files, location, algorithm.build())?;
                let id = backup.id();
                writeln!(out, "Created backup {}", id).map_err(write_err)?;
                let entry = AuditEntry::new(Operation::Create, EntityType::Backup, id.to_string())
                    .with_details(&backup.listing());
                self.record(entry)?;
                Some(id)
            }

            ShellCommand::Rp { id, mode } => {
                let incremental = mode
                    .map(|m| m.is_incremental())
                    .unwrap_or(self.settings.default_incremental);
                let point = self.manager.get_mut(id)?.create_restore_point(incremental)?;
                self.report_snapshot(id, point, incremental, out)?;
                Some(id)
            }

            ShellCommand::Af { id, mode, files } => {
                let incremental = mode.is_incremental();
                let point = self.manager.get_mut(id)?.add_files(files, incremental)?;
                self.report_snapshot(id, point, incremental, out)?;
                Some(id)
            }

            ShellCommand::Rf { id, mode, files } => {
                let incremental = mode.is_incremental();
                let point = self.manager.get_mut(id)?.remove_files(files, incremental)?;
                self.report_snapshot(id, point, incremental, out)?;
                Some(id)
            }

            ShellCommand::Rrp { id, restore_point } => {
                let removed = self.manager.get_mut(id)?.delete_restore_point(restore_point)?;
                writeln!(out, "Deleted restore point {} from {}", removed.id, id)
                    .map_err(write_err)?;
                let entry = AuditEntry::new(
                    Operation::Delete,
                    EntityType::RestorePoint,
                    point_entity(id, removed.id),
                )
                .with_details(&removed);
                self.record(entry)?;
                Some(id)
            }

            ShellCommand::Remove { id } => {
                self.manager.remove(id)?;
                writeln!(out, "Removed backup {}", id).map_err(write_err)?;
                self.record(AuditEntry::new(
                    Operation::Remove,
                    EntityType::Backup,
                    id.to_string(),
                ))?;
                None
            }

            ShellCommand::Cleanup { id } => {
                let deleted = self.run_cleanup(id)?;
                writeln!(out, "Deleted {} restore point(s) from {}", deleted, id)
                    .map_err(write_err)?;
                Some(id)
            }

            ShellCommand::Limit { id, policy } => {
                let policy = policy.to_policy()?;
                let description = policy.to_string();
                self.manager.get_mut(id)?.set_policy(policy.clone())?;
                writeln!(out, "Limit of {} set to {}", id, description).map_err(write_err)?;
                let entry = AuditEntry::new(Operation::Policy, EntityType::Backup, id.to_string())
                    .with_details(&policy)
                    .with_summary(description);
                self.record(entry)?;
                Some(id)
            }

            ShellCommand::Restore {
                id,
                restore_point,
                destination,
            } => {
                self.manager
                    .get_mut(id)?
                    .restore_files(restore_point, &destination)?;
                writeln!(
                    out,
                    "Restored {} of {} to {}",
                    restore_point,
                    id,
                    destination.display()
                )
                .map_err(write_err)?;
                let entry = AuditEntry::new(
                    Operation::Restore,
                    EntityType::RestorePoint,
                    point_entity(id, restore_point),
                )
                .with_details(&json!({ "destination": destination }));
                self.record(entry)?;
                None
            }
        };

        if let Some(id) = touched.filter(|_| auto_cleanup) {
            let deleted = self.run_cleanup(id)?;
            if deleted > 0 {
                writeln!(out, "Cleanup deleted {} restore point(s) from {}", deleted, id)
                    .map_err(write_err)?;
            }
        }

        Ok(Flow::Continue)
    }

    fn list<W: Write>(&self, format: ListFormat, out: &mut W) -> BackupResult<()> {
        let listing = self.manager.listing();
        match format {
            ListFormat::Text => write!(out, "{}", format_backup_list(&listing)).map_err(write_err)?,
            ListFormat::Json => {
                export_json(listing, out, true)?;
                writeln!(out).map_err(write_err)?;
            }
            ListFormat::Yaml => export_yaml(listing, out)?,
        }
        if self.manager.is_empty() && format == ListFormat::Text {
            writeln!(out).map_err(write_err)?;
        }
        Ok(())
    }

    fn report_snapshot<W: Write>(
        &self,
        id: BackupId,
        point: RestorePointId,
        incremental: bool,
        out: &mut W,
    ) -> BackupResult<()> {
        let backup = self.manager.get(id)?;
        writeln!(
            out,
            "Created {} restore point {} in {} (total size {})",
            if incremental { "incremental" } else { "full" },
            point,
            id,
            backup.total_size()
        )
        .map_err(write_err)?;

        let details = backup.restore_point(point)?;
        let entry = AuditEntry::new(
            Operation::Snapshot,
            EntityType::RestorePoint,
            point_entity(id, point),
        )
        .with_details(details);
        self.record(entry)
    }

    /// Run cleanup on one backup and audit it when anything was deleted
    ///
    /// A cleanup stopped by a failed merge keeps the deletions made before
    /// it; those are audited before the error is returned.
    fn run_cleanup(&mut self, id: BackupId) -> BackupResult<usize> {
        let backup: &mut Backup = self.manager.get_mut(id)?;
        let policy = backup.policy().to_string();
        let before = backup.restore_point_ids();

        match backup.cleanup() {
            Ok(deleted) => {
                self.record_cleanup(id, &policy, &deleted)?;
                Ok(deleted.len())
            }
            Err(e) => {
                let after = backup.restore_point_ids();
                let deleted: Vec<RestorePointId> = before
                    .into_iter()
                    .filter(|point| !after.contains(point))
                    .collect();
                self.record_cleanup(id, &policy, &deleted).and(Err(e))
            }
        }
    }

    fn record_cleanup(
        &self,
        id: BackupId,
        policy: &str,
        deleted: &[RestorePointId],
    ) -> BackupResult<()> {
        if deleted.is_empty() {
            return Ok(());
        }
        let entry = AuditEntry::new(Operation::Cleanup, EntityType::Backup, id.to_string())
            .with_details(&json!({ "policy": policy, "deleted": deleted }))
            .with_summary(format!("deleted {} restore point(s)", deleted.len()));
        self.record(entry)
    }

    /// Audit every deleted restore point whose storage is still held
    fn record_release_failures(&mut self, id: BackupId) -> BackupResult<()> {
        let failures = match self.manager.get_mut(id) {
            Ok(backup) => backup.take_release_failures(),
            Err(_) => return Ok(()),
        };
        for failure in failures {
            let entry = AuditEntry::new(
                Operation::Unreleased,
                EntityType::RestorePoint,
                point_entity(id, failure.restore_point),
            )
            .with_summary(failure.reason.clone())
            .with_details(&failure);
            self.record(entry)?;
        }
        Ok(())
    }

    fn record(&self, entry: AuditEntry) -> BackupResult<()> {
        match &self.audit {
            Some(logger) => logger.log(&entry),
            None => Ok(()),
        }
    }
}
