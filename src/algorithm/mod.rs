//! Backup algorithms
//!
//! A chain never touches restore point data itself. It hands file sets and
//! storage locations to a [`BackupAlgorithm`], which reports back the size of
//! whatever it stored.
//!
//! Two reference algorithms ship with the crate. Both keep their data in
//! memory:
//!
//! - Separate Storage (`ss`): every captured file is its own blob
//! - Combined Storage (`cs`): a point's files share one archive with a header

mod simulated;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{BackupError, BackupResult};

pub use simulated::{SimulatedStorage, ARCHIVE_HEADER_SIZE, DEFAULT_BLOCK_SIZE};

/// Byte-level work a chain delegates for its restore points
///
/// Implementations travel with their chain, so they must be `Send`.
pub trait BackupAlgorithm: Send {
    /// Human-readable name shown in listings
    fn name(&self) -> &str;

    /// Store `files` at `location` and return the stored size
    ///
    /// With `incremental` set and a `parent` location given, only the delta
    /// against the parent is stored.
    fn backup_files(
        &mut self,
        files: &BTreeSet<PathBuf>,
        location: &Path,
        incremental: bool,
        parent: Option<&Path>,
    ) -> BackupResult<u64>;

    /// Materialize the point stored at `location` into `destination`
    fn restore_files(&mut self, location: &Path, destination: &Path) -> BackupResult<()>;

    /// Fold `source` into `destination` in place and return the new size of
    /// `destination`
    ///
    /// Releasing `source` afterwards is the caller's job.
    fn merge_restore_points(&mut self, source: &Path, destination: &Path) -> BackupResult<u64>;

    /// Free whatever is stored at `location`, including anything beneath it
    fn release(&mut self, _location: &Path) -> BackupResult<()> {
        Ok(())
    }
}

/// Selector for the bundled algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AlgorithmKind {
    /// One blob per file
    #[default]
    #[serde(rename = "ss")]
    SeparateStorage,
    /// One archive per restore point
    #[serde(rename = "cs")]
    CombinedStorage,
}

impl AlgorithmKind {
    /// Instantiate the algorithm with default block sizes
    pub fn build(&self) -> Box<dyn BackupAlgorithm> {
        Box::new(SimulatedStorage::new(*self))
    }

    /// Display name of the algorithm
    pub fn name(&self) -> &'static str {
        match self {
            Self::SeparateStorage => "Separate Storage",
            Self::CombinedStorage => "Combined Storage",
        }
    }

    /// Short code used on the command line
    pub fn code(&self) -> &'static str {
        match self {
            Self::SeparateStorage => "ss",
            Self::CombinedStorage => "cs",
        }
    }
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for AlgorithmKind {
    type Err = BackupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ss" | "separate" => Ok(Self::SeparateStorage),
            "cs" | "combined" => Ok(Self::CombinedStorage),
            other => Err(BackupError::InvalidArgument(format!(
                "Unknown backup algorithm '{}', expected 'ss' or 'cs'",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse() {
        assert_eq!("ss".parse::<AlgorithmKind>().unwrap(), AlgorithmKind::SeparateStorage);
        assert_eq!("CS".parse::<AlgorithmKind>().unwrap(), AlgorithmKind::CombinedStorage);
        assert!("zip".parse::<AlgorithmKind>().unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_kind_build_names() {
        assert_eq!(AlgorithmKind::SeparateStorage.build().name(), "Separate Storage");
        assert_eq!(AlgorithmKind::CombinedStorage.build().name(), "Combined Storage");
    }

    #[test]
    fn test_kind_serde() {
        let json = serde_json::to_string(&AlgorithmKind::CombinedStorage).unwrap();
        assert_eq!(json, "\"cs\"");
        let kind: AlgorithmKind = serde_json::from_str("\"ss\"").unwrap();
        assert_eq!(kind, AlgorithmKind::SeparateStorage);
    }
}
