//! Backup manager for bsd-netconf
//!
//! Captures the network configuration files either as a ZFS snapshot of the
//! dataset holding them or as plain copies in a timestamp-named directory.
//! The strategy is picked once, when the manager is built.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, error, info, warn};

use super::record::{
    current_hostname, current_user, is_backup_dir_name, snapshot_marker, BackupId, BackupMethod,
    BackupRecord, METADATA_FILE, TIMESTAMP_FORMAT,
};
use super::restore::{read_record, restore_copy, RestoreResult};
use super::snapshot::{resolve_dataset, SnapshotTool, ZfsCli};
use crate::config::paths::NetconfPaths;
use crate::config::settings::{BackupRetention, Settings};
use crate::error::{NetconfError, NetconfResult};
use crate::storage::file_io::{copy_preserving, write_text_atomic};

/// How this manager captures backups
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupStrategy {
    /// Snapshot the named dataset
    Snapshot { dataset: String },
    /// Copy the target files into the backup directory
    Copy,
}

/// Creates, lists, restores and retires full-configuration backups
pub struct BackupManager {
    /// Directory for copy backups and snapshot metadata
    backup_dir: PathBuf,
    /// Files captured by a copy backup
    targets: Vec<PathBuf>,
    /// Retention policy
    retention: BackupRetention,
    /// Snapshot name tag
    prefix: String,
    strategy: BackupStrategy,
    tool: Option<Box<dyn SnapshotTool>>,
}

impl BackupManager {
    /// Create a BackupManager, probing for ZFS unless settings disable it
    pub fn new(paths: &NetconfPaths, settings: &Settings) -> Self {
        if settings.use_snapshots {
            Self::with_snapshot_tool(paths, settings, Box::new(ZfsCli::default()))
        } else {
            Self::copy_only(paths, settings)
        }
    }

    /// Create a BackupManager that always copies files
    pub fn copy_only(paths: &NetconfPaths, settings: &Settings) -> Self {
        Self {
            backup_dir: paths.backup_dir(),
            targets: paths.backup_targets(),
            retention: settings.backup_retention,
            prefix: settings.snapshot_prefix.clone(),
            strategy: BackupStrategy::Copy,
            tool: None,
        }
    }

    /// Create a BackupManager using `tool` when it manages the config directory
    pub fn with_snapshot_tool(
        paths: &NetconfPaths,
        settings: &Settings,
        tool: Box<dyn SnapshotTool>,
    ) -> Self {
        let etc_dir = paths.etc_dir();
        let strategy = match tool.list_mounts() {
            Ok(mounts) => match resolve_dataset(&mounts, &etc_dir) {
                Some(dataset) => {
                    info!("Found ZFS dataset for {}: {}", etc_dir.display(), dataset);
                    BackupStrategy::Snapshot { dataset }
                }
                None => {
                    debug!("No ZFS dataset holds {}", etc_dir.display());
                    BackupStrategy::Copy
                }
            },
            Err(e) => {
                debug!("ZFS not available: {}", e);
                BackupStrategy::Copy
            }
        };

        Self {
            strategy,
            tool: Some(tool),
            ..Self::copy_only(paths, settings)
        }
    }

    pub fn strategy(&self) -> &BackupStrategy {
        &self.strategy
    }

    /// Whether backups are taken as snapshots
    pub fn is_snapshot_capable(&self) -> bool {
        matches!(self.strategy, BackupStrategy::Snapshot { .. })
    }

    /// Get backup directory path
    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    pub fn retention(&self) -> BackupRetention {
        self.retention
    }

    /// Turn a user-supplied string into a backup identifier
    pub fn parse_id(&self, raw: &str) -> NetconfResult<BackupId> {
        BackupId::parse(raw, &self.prefix)
    }

    /// Capture the configuration and enforce retention
    ///
    /// Returns the new backup's identifier. On failure nothing is left
    /// behind: no half-filled directory and no snapshot without metadata.
    pub fn create(&self, reason: &str) -> NetconfResult<BackupId> {
        let id = self.capture(reason)?;
        if let Err(e) = self.enforce_retention() {
            warn!("Retention after backup {} failed: {}", id, e);
        }
        Ok(id)
    }

    /// Capture the configuration without evicting older backups
    ///
    /// Used when an existing backup must survive until a later step, such as
    /// the safety backup taken before a restore. Call `enforce_retention`
    /// once that step is done.
    pub fn capture(&self, reason: &str) -> NetconfResult<BackupId> {
        let result = match &self.strategy {
            BackupStrategy::Snapshot { dataset } => self.create_snapshot(dataset, reason),
            BackupStrategy::Copy => self.create_copy(reason),
        };

        if let Err(e) = &result {
            error!("Error creating backup: {}", e);
        }

        result
    }

    fn new_record(&self, strategy: BackupMethod, reason: &str) -> BackupRecord {
        BackupRecord {
            timestamp: Utc::now(),
            strategy,
            files: Vec::new(),
            reason: reason.to_string(),
            user: current_user(),
            hostname: current_hostname(),
            snapshot_name: None,
            directory: None,
        }
    }

    fn create_snapshot(&self, dataset: &str, reason: &str) -> NetconfResult<BackupId> {
        let tool = self.snapshot_tool()?;
        let mut record = self.new_record(BackupMethod::Snapshot, reason);
        let stamp = record.timestamp.format(TIMESTAMP_FORMAT).to_string();
        let name = format!("{}{}{}", dataset, snapshot_marker(&self.prefix), stamp);

        tool.create(&name)?;
        record.snapshot_name = Some(name.clone());

        if let Err(e) = self.write_json(&self.snapshot_metadata_path(&stamp), &record) {
            if let Err(destroy_err) = tool.destroy(&name) {
                warn!("Could not remove snapshot {}: {}", name, destroy_err);
            }
            return Err(e);
        }

        info!("Created ZFS snapshot: {}", name);
        Ok(BackupId::Snapshot(name))
    }

    fn create_copy(&self, reason: &str) -> NetconfResult<BackupId> {
        fs::create_dir_all(&self.backup_dir).map_err(|e| {
            NetconfError::Backup(format!("Failed to create backup directory: {}", e))
        })?;

        let mut record = self.new_record(BackupMethod::Copy, reason);
        let stamp = record.timestamp.format(TIMESTAMP_FORMAT).to_string();
        let name = self.next_dir_name(&stamp)?;
        let backup_path = self.backup_dir.join(&name);

        fs::create_dir(&backup_path).map_err(|e| {
            NetconfError::Backup(format!(
                "Failed to create {}: {}",
                backup_path.display(),
                e
            ))
        })?;
        record.directory = Some(name.clone());

        if let Err(e) = self.fill_copy_backup(&backup_path, &mut record) {
            let _ = fs::remove_dir_all(&backup_path);
            return Err(e);
        }

        info!("Created file backup: {}", backup_path.display());
        Ok(BackupId::Copy(name))
    }

    fn fill_copy_backup(&self, backup_path: &Path, record: &mut BackupRecord) -> NetconfResult<()> {
        for target in &self.targets {
            let Some(filename) = target.file_name() else {
                continue;
            };

            if !target.is_file() {
                debug!("Config file does not exist: {}", target.display());
                continue;
            }

            copy_preserving(target, &backup_path.join(filename)).map_err(|e| {
                NetconfError::Backup(format!("Failed to copy {}: {}", target.display(), e))
            })?;
            record.files.push(filename.to_string_lossy().into_owned());
            debug!("Backed up: {}", target.display());
        }

        self.write_json(&backup_path.join(METADATA_FILE), record)
    }

    /// Directory name for a backup taken at `stamp`
    ///
    /// Backups within the same second get `-01`, `-02`, ... after the highest
    /// suffix already present, so names keep sorting in creation order.
    fn next_dir_name(&self, stamp: &str) -> NetconfResult<String> {
        let highest = self
            .copy_backup_names()?
            .iter()
            .filter(|name| name.starts_with(stamp))
            .map(|name| name.get(16..).and_then(|s| s.parse::<u32>().ok()).unwrap_or(0))
            .max();

        match highest {
            None => Ok(stamp.to_string()),
            Some(n) if n < 99 => Ok(format!("{}-{:02}", stamp, n + 1)),
            Some(_) => Err(NetconfError::Backup(format!(
                "Too many backups within {}",
                stamp
            ))),
        }
    }

    fn write_json(&self, path: &Path, record: &BackupRecord) -> NetconfResult<()> {
        let json = serde_json::to_string_pretty(record)
            .map_err(|e| NetconfError::Backup(format!("Failed to serialize metadata: {}", e)))?;

        write_text_atomic(path, &json, None).map_err(|e| {
            NetconfError::Backup(format!(
                "Failed to write metadata {}: {}",
                path.display(),
                e
            ))
        })
    }

    fn snapshot_metadata_path(&self, stamp: &str) -> PathBuf {
        self.backup_dir.join(format!("snapshot-{}.json", stamp))
    }

    fn snapshot_tool(&self) -> NetconfResult<&dyn SnapshotTool> {
        match (&self.strategy, &self.tool) {
            (BackupStrategy::Snapshot { .. }, Some(tool)) => Ok(tool.as_ref()),
            _ => Err(NetconfError::Backup(
                "Snapshot backups are not available on this system".into(),
            )),
        }
    }

    /// Copy-backup directory names, sorted oldest first
    fn copy_backup_names(&self) -> NetconfResult<Vec<String>> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.backup_dir).map_err(|e| {
            NetconfError::Backup(format!("Failed to read backup directory: {}", e))
        })?;

        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| is_backup_dir_name(name))
            .collect();
        names.sort();
        Ok(names)
    }

    /// List every backup record, newest first
    pub fn list(&self) -> NetconfResult<Vec<BackupRecord>> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.backup_dir).map_err(|e| {
            error!("Error listing backups: {}", e);
            NetconfError::Backup(format!("Failed to read backup directory: {}", e))
        })?;

        let mut records = Vec::new();
        for entry in entries.filter_map(Result::ok) {
            let path = entry.path();
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };

            if path.is_dir() && is_backup_dir_name(&name) {
                match read_record(&path) {
                    Ok(mut record) => {
                        record.directory = Some(name);
                        records.push(record);
                    }
                    Err(e) => warn!("Skipping backup {}: {}", name, e),
                }
            } else if name.starts_with("snapshot-") && name.ends_with(".json") {
                match read_snapshot_record(&path) {
                    Ok(record) => records.push(record),
                    Err(e) => warn!("Skipping snapshot metadata {}: {}", name, e),
                }
            }
        }

        // Sort by date, newest first
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(records)
    }

    /// Get the record for one backup
    pub fn info(&self, id: &BackupId) -> NetconfResult<BackupRecord> {
        self.list()?
            .into_iter()
            .find(|record| record.id().as_ref() == Some(id))
            .ok_or_else(|| NetconfError::backup_not_found(id.as_str()))
    }

    /// Restore live configuration from a backup
    ///
    /// A snapshot restore rolls the whole dataset back.
    pub fn restore(&self, id: &BackupId) -> NetconfResult<RestoreResult> {
        let result = match id {
            BackupId::Snapshot(name) => self.snapshot_tool().and_then(|tool| {
                tool.rollback(name)?;
                Ok(RestoreResult {
                    id: name.clone(),
                    rolled_back: true,
                    ..Default::default()
                })
            }),
            BackupId::Copy(dir) => {
                let backup_path = self.backup_dir.join(dir);
                if backup_path.is_dir() {
                    restore_copy(dir, &backup_path, &self.targets)
                } else {
                    Err(NetconfError::backup_not_found(dir.as_str()))
                }
            }
        };

        match &result {
            Ok(r) => info!("{}", r.summary()),
            Err(e) => error!("Error restoring backup {}: {}", id, e),
        }
        result
    }

    /// Delete a backup
    pub fn delete(&self, id: &BackupId) -> NetconfResult<()> {
        let result = match id {
            BackupId::Snapshot(name) => self.delete_snapshot(name),
            BackupId::Copy(dir) => {
                let backup_path = self.backup_dir.join(dir);
                if !backup_path.is_dir() {
                    Err(NetconfError::backup_not_found(dir.as_str()))
                } else {
                    fs::remove_dir_all(&backup_path).map_err(|e| {
                        NetconfError::Backup(format!("Failed to delete {}: {}", dir, e))
                    })
                }
            }
        };

        match &result {
            Ok(()) => info!("Deleted backup: {}", id),
            Err(e) => error!("Error deleting backup {}: {}", id, e),
        }
        result
    }

    fn delete_snapshot(&self, name: &str) -> NetconfResult<()> {
        self.snapshot_tool()?.destroy(name)?;

        let marker = snapshot_marker(&self.prefix);
        if let Some((_, stamp)) = name.split_once(&marker) {
            let metadata_path = self.snapshot_metadata_path(stamp);
            if metadata_path.exists() {
                fs::remove_file(&metadata_path).map_err(|e| {
                    NetconfError::Backup(format!(
                        "Failed to remove {}: {}",
                        metadata_path.display(),
                        e
                    ))
                })?;
            }
        }
        Ok(())
    }

    /// Delete all but the newest backups allowed by the retention policy
    ///
    /// Returns the identifiers that were removed.
    pub fn enforce_retention(&self) -> NetconfResult<Vec<BackupId>> {
        let (candidates, keep) = match &self.strategy {
            BackupStrategy::Snapshot { dataset } => {
                let ours = format!("{}{}", dataset, snapshot_marker(&self.prefix));
                let mut names: Vec<String> = self
                    .snapshot_tool()?
                    .list_snapshots()?
                    .into_iter()
                    .filter(|name| name.starts_with(&ours))
                    .collect();
                names.sort();
                let ids = names.into_iter().map(BackupId::Snapshot).collect::<Vec<_>>();
                (ids, self.retention.snapshot_keep)
            }
            BackupStrategy::Copy => {
                let ids = self
                    .copy_backup_names()?
                    .into_iter()
                    .map(BackupId::Copy)
                    .collect::<Vec<_>>();
                (ids, self.retention.copy_keep)
            }
        };

        let excess = candidates.len().saturating_sub(keep);
        let mut deleted = Vec::with_capacity(excess);
        for id in candidates.into_iter().take(excess) {
            self.delete(&id)?;
            info!("Cleaned up old backup: {}", id);
            deleted.push(id);
        }

        Ok(deleted)
    }
}

fn read_snapshot_record(path: &Path) -> NetconfResult<BackupRecord> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}
