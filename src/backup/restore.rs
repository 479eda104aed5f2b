//! Restoring copy backups

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::record::{BackupRecord, METADATA_FILE};
use crate::error::{NetconfError, NetconfResult};
use crate::storage::file_io::{copy_preserving, temp_path_for};

/// Result of a restore operation
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RestoreResult {
    /// Identifier that was restored
    pub id: String,
    /// Live files that were replaced
    pub restored: Vec<PathBuf>,
    /// Recorded files that were skipped, with the reason
    pub skipped: Vec<String>,
    /// Whether a snapshot rollback was performed
    pub rolled_back: bool,
}

impl RestoreResult {
    /// Get a summary of what was restored
    pub fn summary(&self) -> String {
        if self.rolled_back {
            return format!("Rolled back to snapshot {}", self.id);
        }

        let mut parts = vec![format!(
            "Restored {} file(s) from {}",
            self.restored.len(),
            self.id
        )];
        if !self.skipped.is_empty() {
            parts.push(format!("skipped {}", self.skipped.len()));
        }
        parts.join(", ")
    }
}

/// Read the metadata record inside a copy-backup directory
pub(crate) fn read_record(backup_path: &Path) -> NetconfResult<BackupRecord> {
    let metadata_path = backup_path.join(METADATA_FILE);
    let contents = fs::read_to_string(&metadata_path).map_err(|e| {
        NetconfError::Backup(format!(
            "Failed to read backup metadata {}: {}",
            metadata_path.display(),
            e
        ))
    })?;

    serde_json::from_str(&contents).map_err(|e| {
        NetconfError::Backup(format!(
            "Failed to parse backup metadata {}: {}",
            metadata_path.display(),
            e
        ))
    })
}

/// Copy every recorded file from `backup_path` back over its live path
///
/// Files whose live path is unknown, or that are missing from the backup,
/// are skipped with a warning. A failed copy fails the whole restore.
pub(crate) fn restore_copy(
    id: &str,
    backup_path: &Path,
    targets: &[PathBuf],
) -> NetconfResult<RestoreResult> {
    let record = read_record(backup_path)?;
    let mut result = RestoreResult {
        id: id.to_string(),
        ..Default::default()
    };

    for filename in &record.files {
        let Some(dest) = targets
            .iter()
            .find(|t| t.file_name().is_some_and(|n| n == filename.as_str()))
        else {
            warn!("Unknown config file in backup {}: {}", id, filename);
            result.skipped.push(format!("{}: no known location", filename));
            continue;
        };

        let source = backup_path.join(filename);
        if !source.is_file() {
            warn!("Backup file not found: {}", source.display());
            result.skipped.push(format!("{}: missing from backup", filename));
            continue;
        }

        replace_with_copy(&source, dest)?;
        info!("Restored: {}", dest.display());
        result.restored.push(dest.clone());
    }

    Ok(result)
}

fn replace_with_copy(source: &Path, dest: &Path) -> NetconfResult<()> {
    let temp = temp_path_for(dest);

    let outcome = copy_preserving(source, &temp).and_then(|()| fs::rename(&temp, dest));
    if let Err(e) = outcome {
        let _ = fs::remove_file(&temp);
        return Err(NetconfError::Backup(format!(
            "Failed to restore {}: {}",
            dest.display(),
            e
        )));
    }

    Ok(())
}
