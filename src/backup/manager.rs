//! Backup registry
//!
//! Owns every backup of a session, keyed by a monotonically assigned id.
//! Backups are independent of each other; the registry only dispatches.

use std::path::PathBuf;

use super::chain::Backup;
use super::listing::BackupListing;
use crate::algorithm::BackupAlgorithm;
use crate::error::{BackupError, BackupResult};
use crate::models::BackupId;
use crate::retention::RetentionPolicy;

/// Registry of backups
#[derive(Debug, Default)]
pub struct BackupManager {
    /// Backups in creation order
    backups: Vec<Backup>,
    /// Id handed to the next backup
    next_backup_id: BackupId,
    /// Policy attached to newly created backups
    default_policy: RetentionPolicy,
}

impl BackupManager {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry whose new backups start with `policy`
    pub fn with_default_policy(policy: RetentionPolicy) -> BackupResult<Self> {
        policy.validate()?;
        Ok(Self {
            default_policy: policy,
            ..Self::default()
        })
    }

    /// Create a backup of `files` stored under `location`
    pub fn create<I, P>(
        &mut self,
        files: I,
        location: impl Into<PathBuf>,
        algorithm: Box<dyn BackupAlgorithm>,
    ) -> BackupResult<&mut Backup>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let id = self.next_backup_id;
        let mut backup = Backup::create(id, files, location, algorithm)?;
        backup.set_policy(self.default_policy.clone())?;

        self.next_backup_id = id.next();
        self.backups.push(backup);
        let index = self.backups.len() - 1;
        Ok(&mut self.backups[index])
    }

    /// Get a backup by id
    pub fn get(&self, id: BackupId) -> BackupResult<&Backup> {
        self.backups
            .iter()
            .find(|backup| backup.id() == id)
            .ok_or_else(|| BackupError::backup_not_found(id.to_string()))
    }

    /// Get a backup by id for mutation
    pub fn get_mut(&mut self, id: BackupId) -> BackupResult<&mut Backup> {
        self.backups
            .iter_mut()
            .find(|backup| backup.id() == id)
            .ok_or_else(|| BackupError::backup_not_found(id.to_string()))
    }

    /// Release a backup's storage and forget it
    pub fn remove(&mut self, id: BackupId) -> BackupResult<()> {
        let index = self
            .backups
            .iter()
            .position(|backup| backup.id() == id)
            .ok_or_else(|| BackupError::backup_not_found(id.to_string()))?;

        self.backups[index].remove()?;
        self.backups.remove(index);
        Ok(())
    }

    /// All backups in creation order
    pub fn backups(&self) -> &[Backup] {
        &self.backups
    }

    pub fn len(&self) -> usize {
        self.backups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backups.is_empty()
    }

    /// Presentation view of every backup
    pub fn listing(&self) -> Vec<BackupListing> {
        self.backups.iter().map(Backup::listing).collect()
    }
}
