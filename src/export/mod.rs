//! Export module for backup-chain
//!
//! Provides listing export in machine-readable formats:
//! - JSON: for tooling and verification
//! - YAML: for human inspection

pub mod json;
pub mod yaml;

pub use json::{export_json, import_from_json, BackupExport, ExportMetadata, EXPORT_SCHEMA_VERSION};
pub use yaml::{export_yaml, import_from_yaml};
