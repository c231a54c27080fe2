//! In-memory reference algorithms
//!
//! Stored data is modelled as a set of file entries per location. Sizes are
//! derived from the entry count, so every result is deterministic.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use super::{AlgorithmKind, BackupAlgorithm};
use crate::error::{BackupError, BackupResult};

/// Bytes charged per stored file entry
pub const DEFAULT_BLOCK_SIZE: u64 = 4096;

/// Fixed overhead of a Combined Storage archive
pub const ARCHIVE_HEADER_SIZE: u64 = 512;

/// What is kept at one location
#[derive(Debug, Clone, Default)]
struct StoredPoint {
    /// Full tracked file set of the point
    files: BTreeSet<PathBuf>,
    /// Entries physically held at this location (a subset of `files` for deltas)
    entries: BTreeSet<PathBuf>,
}

/// Separate or Combined Storage, kept in memory
#[derive(Debug, Clone)]
pub struct SimulatedStorage {
    kind: AlgorithmKind,
    block_size: u64,
    points: HashMap<PathBuf, StoredPoint>,
    restored: HashMap<PathBuf, BTreeSet<PathBuf>>,
}

impl SimulatedStorage {
    /// Create an empty store with the default block size
    pub fn new(kind: AlgorithmKind) -> Self {
        Self::with_block_size(kind, DEFAULT_BLOCK_SIZE)
    }

    /// Create an empty store charging `block_size` bytes per entry
    pub fn with_block_size(kind: AlgorithmKind, block_size: u64) -> Self {
        Self {
            kind,
            block_size,
            points: HashMap::new(),
            restored: HashMap::new(),
        }
    }

    /// Which layout this store simulates
    pub fn kind(&self) -> AlgorithmKind {
        self.kind
    }

    /// Entries physically stored at `location`
    pub fn entries(&self, location: &Path) -> Option<&BTreeSet<PathBuf>> {
        self.points.get(location).map(|point| &point.entries)
    }

    /// File set last materialized at `destination`
    pub fn restored(&self, destination: &Path) -> Option<&BTreeSet<PathBuf>> {
        self.restored.get(destination)
    }

    /// Number of locations currently holding data
    pub fn location_count(&self) -> usize {
        self.points.len()
    }

    fn size_of(&self, entry_count: usize) -> u64 {
        let data = entry_count as u64 * self.block_size;
        match self.kind {
            AlgorithmKind::SeparateStorage => data,
            AlgorithmKind::CombinedStorage => ARCHIVE_HEADER_SIZE + data,
        }
    }

    fn point(&self, location: &Path) -> BackupResult<&StoredPoint> {
        self.points.get(location).ok_or_else(|| missing(location))
    }
}

fn missing(location: &Path) -> BackupError {
    BackupError::NotFound {
        entity_type: "Storage location",
        identifier: location.display().to_string(),
    }
}

impl BackupAlgorithm for SimulatedStorage {
    fn name(&self) -> &str {
        self.kind.name()
    }

    fn backup_files(
        &mut self,
        files: &BTreeSet<PathBuf>,
        location: &Path,
        incremental: bool,
        parent: Option<&Path>,
    ) -> BackupResult<u64> {
        if self.points.contains_key(location) {
            return Err(BackupError::Algorithm(format!(
                "Location already holds a restore point: {}",
                location.display()
            )));
        }

        let entries: BTreeSet<PathBuf> = match (incremental, parent) {
            (true, Some(parent)) => {
                let parent = self.point(parent)?;
                files.difference(&parent.files).cloned().collect()
            }
            _ => files.clone(),
        };

        let size = self.size_of(entries.len());
        self.points.insert(
            location.to_path_buf(),
            StoredPoint {
                files: files.clone(),
                entries,
            },
        );
        Ok(size)
    }

    fn restore_files(&mut self, location: &Path, destination: &Path) -> BackupResult<()> {
        let files = self.point(location)?.files.clone();
        self.restored.insert(destination.to_path_buf(), files);
        Ok(())
    }

    fn merge_restore_points(&mut self, source: &Path, destination: &Path) -> BackupResult<u64> {
        let source_entries = self.point(source)?.entries.clone();
        let target = self
            .points
            .get_mut(destination)
            .ok_or_else(|| missing(destination))?;

        // Entries the destination no longer tracks are dropped on the way in
        let inherited: Vec<PathBuf> = source_entries
            .into_iter()
            .filter(|entry| target.files.contains(entry))
            .collect();
        target.entries.extend(inherited);

        let count = target.entries.len();
        Ok(self.size_of(count))
    }

    fn release(&mut self, location: &Path) -> BackupResult<()> {
        self.points.retain(|stored, _| !stored.starts_with(location));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(names: &[&str]) -> BTreeSet<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_full_backup_sizes() {
        let mut ss = SimulatedStorage::with_block_size(AlgorithmKind::SeparateStorage, 100);
        let mut cs = SimulatedStorage::with_block_size(AlgorithmKind::CombinedStorage, 100);
        let set = files(&["a", "b", "c"]);

        assert_eq!(ss.backup_files(&set, Path::new("/s/0"), false, None).unwrap(), 300);
        assert_eq!(
            cs.backup_files(&set, Path::new("/c/0"), false, None).unwrap(),
            ARCHIVE_HEADER_SIZE + 300
        );
    }

    #[test]
    fn test_incremental_stores_delta() {
        let mut ss = SimulatedStorage::with_block_size(AlgorithmKind::SeparateStorage, 10);
        ss.backup_files(&files(&["a", "b"]), Path::new("/s/0"), false, None)
            .unwrap();

        let size = ss
            .backup_files(
                &files(&["a", "b", "c"]),
                Path::new("/s/1"),
                true,
                Some(Path::new("/s/0")),
            )
            .unwrap();
        assert_eq!(size, 10);
        assert_eq!(ss.entries(Path::new("/s/1")).unwrap(), &files(&["c"]));
    }

    #[test]
    fn test_incremental_without_parent_is_full() {
        let mut ss = SimulatedStorage::with_block_size(AlgorithmKind::SeparateStorage, 10);
        let size = ss
            .backup_files(&files(&["a", "b"]), Path::new("/s/0"), true, None)
            .unwrap();
        assert_eq!(size, 20);
    }

    #[test]
    fn test_unknown_parent() {
        let mut ss = SimulatedStorage::new(AlgorithmKind::SeparateStorage);
        let err = ss
            .backup_files(&files(&["a"]), Path::new("/s/1"), true, Some(Path::new("/s/0")))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_merge_folds_tracked_entries() {
        let mut ss = SimulatedStorage::with_block_size(AlgorithmKind::SeparateStorage, 10);
        ss.backup_files(&files(&["a", "b"]), Path::new("/s/0"), false, None)
            .unwrap();
        // Drops "b", adds "c"
        ss.backup_files(
            &files(&["a", "c"]),
            Path::new("/s/1"),
            true,
            Some(Path::new("/s/0")),
        )
        .unwrap();

        let size = ss
            .merge_restore_points(Path::new("/s/0"), Path::new("/s/1"))
            .unwrap();
        assert_eq!(size, 20);
        assert_eq!(ss.entries(Path::new("/s/1")).unwrap(), &files(&["a", "c"]));
    }

    #[test]
    fn test_restore_records_files() {
        let mut cs = SimulatedStorage::new(AlgorithmKind::CombinedStorage);
        cs.backup_files(&files(&["a"]), Path::new("/c/0"), false, None)
            .unwrap();

        cs.restore_files(Path::new("/c/0"), Path::new("/tmp/out")).unwrap();
        assert_eq!(cs.restored(Path::new("/tmp/out")).unwrap(), &files(&["a"]));

        let err = cs
            .restore_files(Path::new("/c/9"), Path::new("/tmp/out"))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_release_removes_nested_locations() {
        let mut ss = SimulatedStorage::new(AlgorithmKind::SeparateStorage);
        ss.backup_files(&files(&["a"]), Path::new("/s/0"), false, None)
            .unwrap();
        ss.backup_files(&files(&["a"]), Path::new("/s/1"), false, None)
            .unwrap();
        ss.backup_files(&files(&["a"]), Path::new("/other/0"), false, None)
            .unwrap();

        ss.release(Path::new("/s/0")).unwrap();
        assert_eq!(ss.location_count(), 2);

        ss.release(Path::new("/s")).unwrap();
        assert_eq!(ss.location_count(), 1);
    }
}
