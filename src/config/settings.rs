//! User settings for bsd-netconf
//!
//! Manages backup retention and the snapshot-versus-copy preference.

use serde::{Deserialize, Serialize};

use super::paths::NetconfPaths;
use crate::error::NetconfError;
use crate::storage::file_io::write_text_atomic;

/// Backup retention settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupRetention {
    /// Number of ZFS snapshots to keep
    #[serde(default = "default_snapshot_keep")]
    pub snapshot_keep: usize,
    /// Number of copy-backup directories to keep
    #[serde(default = "default_copy_keep")]
    pub copy_keep: usize,
}

fn default_snapshot_keep() -> usize {
    10
}

fn default_copy_keep() -> usize {
    20
}

impl Default for BackupRetention {
    fn default() -> Self {
        Self {
            snapshot_keep: default_snapshot_keep(),
            copy_keep: default_copy_keep(),
        }
    }
}

/// User settings for bsd-netconf
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Backup retention policy
    #[serde(default)]
    pub backup_retention: BackupRetention,

    /// Probe for ZFS and prefer snapshots over file copies
    #[serde(default = "default_use_snapshots")]
    pub use_snapshots: bool,

    /// Tag placed after `@` in snapshot names
    #[serde(default = "default_snapshot_prefix")]
    pub snapshot_prefix: String,
}

fn default_schema_version() -> u32 {
    1
}

fn default_use_snapshots() -> bool {
    true
}

fn default_snapshot_prefix() -> String {
    "netconf".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            backup_retention: BackupRetention::default(),
            use_snapshots: default_use_snapshots(),
            snapshot_prefix: default_snapshot_prefix(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &NetconfPaths) -> Result<Self, NetconfError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
                NetconfError::Io(format!("Failed to read settings file: {}", e))
            })?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                NetconfError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            if settings.snapshot_prefix.is_empty()
                || settings.snapshot_prefix.contains(['@', '/', ' '])
            {
                return Err(NetconfError::Config(format!(
                    "Invalid snapshot_prefix: '{}'",
                    settings.snapshot_prefix
                )));
            }

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &NetconfPaths) -> Result<(), NetconfError> {
        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            NetconfError::Config(format!("Failed to serialize settings: {}", e))
        })?;

        write_text_atomic(&paths.settings_file(), &contents, None)
    }
}
