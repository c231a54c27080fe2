//! Restore point chain
//!
//! A [`Backup`] owns a chronological sequence of restore points together with
//! the algorithm that stores them and the retention policy that trims them.
//! Incremental points depend on their predecessor, so removing a point folds
//! its data into an incremental successor before the point goes away.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::algorithm::BackupAlgorithm;
use crate::clock::{Clock, SystemClock};
use crate::error::{BackupError, BackupResult};
use crate::models::{BackupId, RestorePoint, RestorePointId};
use crate::retention::RetentionPolicy;

/// Storage the algorithm could not free after a restore point was deleted
///
/// The deletion itself stands; only the bytes at `location` are left behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseFailure {
    pub restore_point: RestorePointId,
    pub location: PathBuf,
    pub reason: String,
}

/// A backup: one chain of restore points sharing a storage root
pub struct Backup {
    id: BackupId,
    created_at: DateTime<Utc>,
    location: PathBuf,
    total_size: u64,
    algorithm: Box<dyn BackupAlgorithm>,
    policy: RetentionPolicy,
    /// Oldest first, never empty until the backup is removed
    restore_points: Vec<RestorePoint>,
    next_restore_point_id: RestorePointId,
    clock: Box<dyn Clock>,
    release_failures: Vec<ReleaseFailure>,
}

impl Backup {
    /// Create a backup whose first, full restore point captures `files`
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `files` is empty, or whatever the
    /// algorithm reports while storing the first point.
    pub fn create<I, P>(
        id: BackupId,
        files: I,
        location: impl Into<PathBuf>,
        algorithm: Box<dyn BackupAlgorithm>,
    ) -> BackupResult<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self::create_with_clock(id, files, location, algorithm, Box::new(SystemClock))
    }

    /// Same as [`Backup::create`], reading timestamps from `clock`
    pub fn create_with_clock<I, P>(
        id: BackupId,
        files: I,
        location: impl Into<PathBuf>,
        algorithm: Box<dyn BackupAlgorithm>,
        clock: Box<dyn Clock>,
    ) -> BackupResult<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let files: BTreeSet<PathBuf> = files.into_iter().map(Into::into).collect();
        if files.is_empty() {
            return Err(BackupError::InvalidArgument(
                "A backup needs at least one file".into(),
            ));
        }

        let mut backup = Self {
            id,
            created_at: clock.now(),
            location: location.into(),
            total_size: 0,
            algorithm,
            policy: RetentionPolicy::default(),
            restore_points: Vec::new(),
            next_restore_point_id: RestorePointId::new(0),
            clock,
            release_failures: Vec::new(),
        };

        backup.push_restore_point(files, false)?;
        backup.created_at = backup.restore_points[0].created_at;
        Ok(backup)
    }

    pub fn id(&self) -> BackupId {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Root storage location shared by all restore points
    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Sum of all restore point sizes
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn algorithm_name(&self) -> &str {
        self.algorithm.name()
    }

    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    /// Replace the retention policy
    ///
    /// Nothing is deleted until the next [`Backup::cleanup`].
    pub fn set_policy(&mut self, policy: RetentionPolicy) -> BackupResult<()> {
        policy.validate()?;
        self.policy = policy;
        Ok(())
    }

    /// Restore points, oldest first
    pub fn restore_points(&self) -> &[RestorePoint] {
        &self.restore_points
    }

    pub fn restore_point_ids(&self) -> Vec<RestorePointId> {
        self.restore_points.iter().map(|point| point.id).collect()
    }

    pub fn restore_point(&self, id: RestorePointId) -> BackupResult<&RestorePoint> {
        self.restore_points
            .iter()
            .find(|point| point.id == id)
            .ok_or_else(|| BackupError::restore_point_not_found(id.to_string()))
    }

    /// The newest restore point, `None` once the backup is removed
    pub fn latest_restore_point(&self) -> Option<&RestorePoint> {
        self.restore_points.last()
    }

    /// Files tracked by the newest restore point
    pub fn files(&self) -> Option<&BTreeSet<PathBuf>> {
        self.latest_restore_point().map(|point| &point.files)
    }

    pub fn is_removed(&self) -> bool {
        self.restore_points.is_empty()
    }

    /// Deleted points whose storage could not be released
    pub fn release_failures(&self) -> &[ReleaseFailure] {
        &self.release_failures
    }

    /// Hand over the recorded release failures, clearing them
    pub fn take_release_failures(&mut self) -> Vec<ReleaseFailure> {
        std::mem::take(&mut self.release_failures)
    }

    /// Snapshot the current file set as a new restore point
    pub fn create_restore_point(&mut self, incremental: bool) -> BackupResult<RestorePointId> {
        let files = self.current_files()?.clone();
        self.push_restore_point(files, incremental)
    }

    /// Start tracking `files` and snapshot the enlarged set
    pub fn add_files<I, P>(&mut self, files: I, incremental: bool) -> BackupResult<RestorePointId>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut tracked = self.current_files()?.clone();
        tracked.extend(files.into_iter().map(Into::into));
        self.push_restore_point(tracked, incremental)
    }

    /// Stop tracking `files` and snapshot the reduced set
    ///
    /// Paths that are not tracked are ignored.
    pub fn remove_files<I, P>(
        &mut self,
        files: I,
        incremental: bool,
    ) -> BackupResult<RestorePointId>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut tracked = self.current_files()?.clone();
        for file in files {
            let file: PathBuf = file.into();
            tracked.remove(&file);
        }
        self.push_restore_point(tracked, incremental)
    }

    /// Delete one restore point, merging it into an incremental successor
    ///
    /// Unlike the removal [`Backup::cleanup`] performs, this refuses to take
    /// the last point, so a live chain can never be emptied through it.
    ///
    /// If the algorithm cannot release the deleted point's storage the
    /// deletion still succeeds and the failure is kept in
    /// [`Backup::release_failures`].
    ///
    /// # Errors
    ///
    /// - `NotFound` if no point has this id
    /// - `InvariantViolation` if it is the only point left
    /// - a merge failure, in which case the chain is unchanged
    pub fn delete_restore_point(&mut self, id: RestorePointId) -> BackupResult<RestorePoint> {
        self.ensure_live()?;
        let index = self
            .restore_points
            .iter()
            .position(|point| point.id == id)
            .ok_or_else(|| BackupError::restore_point_not_found(id.to_string()))?;

        if self.restore_points.len() == 1 {
            return Err(BackupError::InvariantViolation(format!(
                "{} is the last restore point of backup {}",
                id, self.id
            )));
        }

        self.remove_restore_point_at(index)
    }

    /// Delete whatever the retention policy marks obsolete
    ///
    /// The newest point always survives. The policy is asked again after
    /// every batch, since merges change sizes. Returns the ids of the deleted
    /// points, oldest first.
    ///
    /// Each deletion is atomic. If a merge fails, the points deleted before
    /// it stay deleted and the error is returned.
    pub fn cleanup(&mut self) -> BackupResult<Vec<RestorePointId>> {
        self.ensure_live()?;
        let mut deleted = Vec::new();

        loop {
            let bad_prefix = self
                .policy
                .bad_prefix_size(&self.restore_points)
                .min(self.restore_points.len() - 1);
            if bad_prefix == 0 {
                break;
            }

            for _ in 0..bad_prefix {
                deleted.push(self.remove_restore_point_at(0)?.id);
            }
        }

        Ok(deleted)
    }

    /// Materialize a restore point at `destination`
    pub fn restore_files(
        &mut self,
        id: RestorePointId,
        destination: impl AsRef<Path>,
    ) -> BackupResult<()> {
        let location = self.restore_point(id)?.location.clone();
        self.algorithm
            .restore_files(&location, destination.as_ref())
    }

    /// Release all storage and drop every restore point
    ///
    /// The backup cannot be used afterwards.
    pub fn remove(&mut self) -> BackupResult<()> {
        self.algorithm.release(&self.location)?;
        self.restore_points.clear();
        self.total_size = 0;
        Ok(())
    }

    fn ensure_live(&self) -> BackupResult<()> {
        if self.is_removed() {
            return Err(BackupError::InvariantViolation(format!(
                "Backup {} has been removed",
                self.id
            )));
        }
        Ok(())
    }

    fn current_files(&self) -> BackupResult<&BTreeSet<PathBuf>> {
        self.ensure_live()?;
        self.files()
            .ok_or_else(|| BackupError::InvariantViolation("Backup has no restore points".into()))
    }

    fn push_restore_point(
        &mut self,
        files: BTreeSet<PathBuf>,
        incremental: bool,
    ) -> BackupResult<RestorePointId> {
        let id = self.next_restore_point_id;
        let location = self.location.join(id.value().to_string());

        // The first point has nothing to be a delta of
        let parent = if incremental {
            self.restore_points.last().map(|point| point.location.clone())
        } else {
            None
        };
        let is_incremental = parent.is_some();

        let size = self
            .algorithm
            .backup_files(&files, &location, is_incremental, parent.as_deref())?;

        self.next_restore_point_id = id.next();
        self.total_size += size;
        self.restore_points.push(RestorePoint::new(
            id,
            self.clock.now(),
            location,
            is_incremental,
            files,
            size,
        ));
        Ok(id)
    }

    /// Remove the point at `index`, repairing its successor first
    ///
    /// Callers guarantee that at least one point remains. The merge is the
    /// last step that can fail; release errors are recorded instead.
    fn remove_restore_point_at(&mut self, index: usize) -> BackupResult<RestorePoint> {
        let removed = &self.restore_points[index];
        let merged_size = match self.restore_points.get(index + 1) {
            Some(next) if next.is_incremental => Some(
                self.algorithm
                    .merge_restore_points(&removed.location, &next.location)?,
            ),
            _ => None,
        };

        let removed = self.restore_points.remove(index);
        self.total_size -= removed.size;

        if let Some(new_size) = merged_size {
            let next = &mut self.restore_points[index];
            self.total_size = self.total_size - next.size + new_size;
            next.size = new_size;
            next.is_incremental = removed.is_incremental;
        }

        if let Err(e) = self.algorithm.release(&removed.location) {
            self.release_failures.push(ReleaseFailure {
                restore_point: removed.id,
                location: removed.location.clone(),
                reason: e.to_string(),
            });
        }
        Ok(removed)
    }
}

impl fmt::Debug for Backup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backup")
            .field("id", &self.id)
            .field("created_at", &self.created_at)
            .field("location", &self.location)
            .field("total_size", &self.total_size)
            .field("algorithm", &self.algorithm.name())
            .field("policy", &self.policy)
            .field("restore_points", &self.restore_points)
            .field("release_failures", &self.release_failures)
            .finish_non_exhaustive()
    }
}
