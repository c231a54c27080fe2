//! Shell command grammar
//!
//! One line of shell input parses into a [`ShellCommand`]. The grammar is
//! positional so lines read like `rp 0 inc` or `limit 0 hybrid any 4096 3`.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::algorithm::AlgorithmKind;
use crate::error::{BackupError, BackupResult};
use crate::models::{BackupId, RestorePointId};
use crate::retention::{CombinationRule, RetentionPolicy};

/// A single parsed shell line
#[derive(Parser, Debug)]
#[command(
    name = "shell",
    no_binary_name = true,
    disable_help_flag = true,
    disable_help_subcommand = true,
    disable_version_flag = true
)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: ShellCommand,
}

impl ShellLine {
    /// Parse whitespace-separated tokens, mapping clap errors to `InvalidArgument`
    pub fn parse_tokens<I, T>(tokens: I) -> BackupResult<ShellCommand>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::try_parse_from(tokens)
            .map(|line| line.command)
            .map_err(|e| BackupError::InvalidArgument(first_line(&e.to_string())))
    }
}

fn first_line(message: &str) -> String {
    message
        .lines()
        .next()
        .unwrap_or_default()
        .trim_start_matches("error: ")
        .to_string()
}

/// Snapshot kind given on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SnapshotMode {
    /// Store only what changed since the previous point
    Inc,
    /// Store every tracked file
    Full,
}

impl SnapshotMode {
    pub fn is_incremental(self) -> bool {
        matches!(self, SnapshotMode::Inc)
    }
}

/// Output format for `list`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

/// Shell commands
#[derive(Subcommand, Debug)]
pub enum ShellCommand {
    /// Show every backup with its restore points
    List {
        #[arg(short, long, value_enum, default_value_t = ListFormat::Text)]
        format: ListFormat,
    },

    /// Create a backup tracking the given files
    New {
        /// Storage algorithm (ss or cs)
        algorithm: AlgorithmKind,
        /// Storage root for the backup
        location: PathBuf,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Snapshot the current file set
    Rp {
        id: BackupId,
        /// Defaults to the configured snapshot mode
        mode: Option<SnapshotMode>,
    },

    /// Track more files and snapshot
    Af {
        id: BackupId,
        mode: SnapshotMode,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Stop tracking files and snapshot
    Rf {
        id: BackupId,
        mode: SnapshotMode,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Delete one restore point
    Rrp {
        id: BackupId,
        restore_point: RestorePointId,
    },

    /// Remove a backup and release its storage
    Remove { id: BackupId },

    /// Apply the retention policy of a backup
    Cleanup { id: BackupId },

    /// Set the retention policy of a backup
    Limit {
        id: BackupId,
        #[command(subcommand)]
        policy: LimitCommand,
    },

    /// Materialize a restore point at a destination
    Restore {
        id: BackupId,
        restore_point: RestorePointId,
        destination: PathBuf,
    },

    /// Leave the shell
    Exit,
}

impl ShellCommand {
    /// Backup the command operates on, if any
    pub fn backup_id(&self) -> Option<BackupId> {
        match self {
            ShellCommand::Rp { id, .. }
            | ShellCommand::Af { id, .. }
            | ShellCommand::Rf { id, .. }
            | ShellCommand::Rrp { id, .. }
            | ShellCommand::Remove { id }
            | ShellCommand::Cleanup { id }
            | ShellCommand::Limit { id, .. }
            | ShellCommand::Restore { id, .. } => Some(*id),
            ShellCommand::List { .. } | ShellCommand::New { .. } | ShellCommand::Exit => None,
        }
    }

    /// Whether the command can change a backup
    pub fn is_mutating(&self) -> bool {
        !matches!(
            self,
            ShellCommand::List { .. } | ShellCommand::Restore { .. } | ShellCommand::Exit
        )
    }
}

/// Retention policies accepted by `limit`
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum LimitCommand {
    /// Keep points while their total size stays within the limit
    Size { limit: u64 },

    /// Keep at most this many points
    Number { limit: usize },

    /// Keep points no older than this many seconds before the newest
    Time { seconds: u64 },

    /// Combine a size limit and a count limit
    Hybrid {
        rule: CombinationRule,
        size: u64,
        count: usize,
    },
}

impl LimitCommand {
    /// Build the retention policy this command describes
    pub fn to_policy(&self) -> BackupResult<RetentionPolicy> {
        match self {
            LimitCommand::Size { limit } => Ok(RetentionPolicy::by_size(*limit)),
            LimitCommand::Number { limit } => Ok(RetentionPolicy::by_number(*limit)),
            LimitCommand::Time { seconds } => {
                let period = i64::try_from(*seconds)
                    .ok()
                    .and_then(chrono::Duration::try_seconds)
                    .ok_or_else(|| {
                        BackupError::InvalidArgument(format!("Period too large: {}s", seconds))
                    })?;
                Ok(RetentionPolicy::by_time(period))
            }
            LimitCommand::Hybrid { rule, size, count } => RetentionPolicy::hybrid(
                *rule,
                vec![
                    RetentionPolicy::by_size(*size),
                    RetentionPolicy::by_number(*count),
                ],
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> BackupResult<ShellCommand> {
        ShellLine::parse_tokens(line.split_whitespace())
    }

    #[test]
    fn test_parse_new() {
        let command = parse("new cs /store/docs a.txt b.txt").unwrap();
        match command {
            ShellCommand::New {
                algorithm,
                location,
                files,
            } => {
                assert_eq!(algorithm, AlgorithmKind::CombinedStorage);
                assert_eq!(location, PathBuf::from("/store/docs"));
                assert_eq!(files.len(), 2);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_new_requires_files() {
        let err = parse("new ss /store/docs").unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_parse_ids_with_or_without_prefix() {
        match parse("rrp bk-1 3").unwrap() {
            ShellCommand::Rrp { id, restore_point } => {
                assert_eq!(id, BackupId::new(1));
                assert_eq!(restore_point, RestorePointId::new(3));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_rp_mode_is_optional() {
        match parse("rp 0").unwrap() {
            ShellCommand::Rp { mode, .. } => assert_eq!(mode, None),
            other => panic!("unexpected command: {:?}", other),
        }
        match parse("rp 0 full").unwrap() {
            ShellCommand::Rp { mode, .. } => assert_eq!(mode, Some(SnapshotMode::Full)),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_limit_hybrid() {
        match parse("limit 0 hybrid all 100 3").unwrap() {
            ShellCommand::Limit { policy, .. } => {
                assert_eq!(
                    policy,
                    LimitCommand::Hybrid {
                        rule: CombinationRule::All,
                        size: 100,
                        count: 3
                    }
                );
                let built = policy.to_policy().unwrap();
                assert_eq!(built.to_string(), "[all of: [by size: 100], [by number: 3]]");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_limit_time_policy() {
        let policy = LimitCommand::Time { seconds: 3600 }.to_policy().unwrap();
        assert_eq!(
            policy,
            RetentionPolicy::by_time(chrono::Duration::try_hours(1).unwrap())
        );
    }

    #[test]
    fn test_unknown_command() {
        let err = parse("frobnicate 1").unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_mutating_commands() {
        assert!(!parse("list").unwrap().is_mutating());
        assert!(!parse("exit").unwrap().is_mutating());
        assert!(parse("cleanup 0").unwrap().is_mutating());
    }

    #[test]
    fn test_backup_id() {
        assert_eq!(parse("rrp 2 0").unwrap().backup_id(), Some(BackupId::new(2)));
        assert_eq!(parse("limit 1 size 10").unwrap().backup_id(), Some(BackupId::new(1)));
        assert_eq!(parse("new ss /store a").unwrap().backup_id(), None);
        assert_eq!(parse("list").unwrap().backup_id(), None);
    }
}
