//! Display formatting for terminal output
//!
//! Provides utilities for formatting backup listings for terminal display.

pub mod backup;

pub use backup::{format_backup_lines, format_backup_list, TIME_FORMAT};
