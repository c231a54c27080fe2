//! YAML Export functionality
//!
//! Exports the registry listing to YAML for human-readable inspection.

use chrono::Utc;
use std::io::Write;

use crate::backup::BackupListing;
use crate::error::{BackupError, BackupResult};
use crate::export::json::BackupExport;

fn export_err(e: impl std::fmt::Display) -> BackupError {
    BackupError::Export(e.to_string())
}

/// Export the listings to YAML, preceded by a comment header
pub fn export_yaml<W: Write>(backups: Vec<BackupListing>, writer: &mut W) -> BackupResult<()> {
    let export = BackupExport::from_listings(backups, Utc::now());

    writeln!(writer, "# backup-chain registry export").map_err(export_err)?;
    writeln!(writer, "# Generated: {}", export.exported_at).map_err(export_err)?;
    writeln!(writer, "# App Version: {}", export.app_version).map_err(export_err)?;
    writeln!(writer).map_err(export_err)?;

    serde_yaml::to_writer(writer, &export).map_err(export_err)?;

    Ok(())
}

/// Read back a YAML export
pub fn import_from_yaml(yaml_str: &str) -> BackupResult<BackupExport> {
    let export: BackupExport = serde_yaml::from_str(yaml_str).map_err(export_err)?;

    export.validate().map_err(BackupError::Export)?;

    Ok(export)
}
