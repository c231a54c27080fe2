//! CLI command handlers
//!
//! This module bridges clap argument parsing with the backup registry:
//! the shell grammar, the session that executes it, and the loops that
//! feed it from a terminal or a script.

pub mod commands;
pub mod session;
pub mod shell;

pub use commands::{LimitCommand, ListFormat, ShellCommand, ShellLine, SnapshotMode};
pub use session::{Flow, Session};
pub use shell::{run_script, run_shell, ScriptSummary, PROMPT};
