//! Backup display formatting
//!
//! Renders the indented listing shown by the `list` shell command.

use chrono::{DateTime, Utc};

use crate::backup::{BackupListing, RestorePointListing};

/// Timestamp layout used in every text listing
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn format_time(time: &DateTime<Utc>) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Format one backup as listing lines, restore points in chronological order
pub fn format_backup_lines(listing: &BackupListing) -> Vec<String> {
    let mut lines = vec![
        format!("id: {}", listing.id),
        format!("creation time: {}", format_time(&listing.created_at)),
        format!("location: {}", listing.location.display()),
        format!("size: {}", listing.size),
        format!("algorithm: {}", listing.algorithm),
        format!("limit: {}", listing.policy),
        "restore points:".to_string(),
    ];

    for point in &listing.restore_points {
        lines.extend(format_restore_point_lines(point));
    }

    lines
}

fn format_restore_point_lines(point: &RestorePointListing) -> Vec<String> {
    let mut lines = vec![
        format!("  id: {}", point.id),
        format!("  creation time: {}", format_time(&point.created_at)),
        format!("  location: {}", point.location.display()),
        format!("  incremental: {}", point.incremental),
        format!("  size: {}", point.size),
        "  files:".to_string(),
    ];
    lines.extend(point.files.iter().map(|file| format!("    {}", file.display())));
    lines
}

/// Format every backup, one after another
pub fn format_backup_list(listings: &[BackupListing]) -> String {
    if listings.is_empty() {
        return "No backups found.".to_string();
    }

    let mut output = String::new();
    for line in listings.iter().flat_map(format_backup_lines) {
        output.push_str(&line);
        output.push('\n');
    }
    output
}
