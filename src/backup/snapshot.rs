//! ZFS snapshot access
//!
//! The manager only talks to ZFS through the `SnapshotTool` trait, so the
//! snapshot strategy can be exercised without a pool.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::{NetconfError, NetconfResult};

/// A dataset and the directory it is mounted on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetMount {
    pub dataset: String,
    pub mountpoint: PathBuf,
}

/// Operations the snapshot strategy needs from the storage system
pub trait SnapshotTool {
    /// Every filesystem dataset with its mountpoint
    fn list_mounts(&self) -> NetconfResult<Vec<DatasetMount>>;

    /// Every snapshot name on the system
    fn list_snapshots(&self) -> NetconfResult<Vec<String>>;

    fn create(&self, snapshot: &str) -> NetconfResult<()>;

    /// Replace the live dataset state with the snapshot's
    fn rollback(&self, snapshot: &str) -> NetconfResult<()>;

    fn destroy(&self, snapshot: &str) -> NetconfResult<()>;
}

/// `SnapshotTool` backed by the `zfs` command
#[derive(Debug, Clone)]
pub struct ZfsCli {
    binary: PathBuf,
}

impl Default for ZfsCli {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("zfs"),
        }
    }
}

impl ZfsCli {
    /// Use a specific `zfs` binary
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn run(&self, args: &[&str]) -> NetconfResult<String> {
        debug!("Running {} {}", self.binary.display(), args.join(" "));

        let output = Command::new(&self.binary).args(args).output().map_err(|e| {
            NetconfError::Backup(format!("Failed to run {}: {}", self.binary.display(), e))
        })?;

        if !output.status.success() {
            return Err(NetconfError::Backup(format!(
                "zfs {} failed: {}",
                args.first().copied().unwrap_or_default(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl SnapshotTool for ZfsCli {
    fn list_mounts(&self) -> NetconfResult<Vec<DatasetMount>> {
        let stdout = self.run(&["list", "-H", "-t", "filesystem", "-o", "name,mountpoint"])?;
        Ok(parse_mounts(&stdout))
    }

    fn list_snapshots(&self) -> NetconfResult<Vec<String>> {
        let stdout = self.run(&["list", "-H", "-t", "snapshot", "-o", "name"])?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn create(&self, snapshot: &str) -> NetconfResult<()> {
        self.run(&["snapshot", snapshot]).map(|_| ())
    }

    fn rollback(&self, snapshot: &str) -> NetconfResult<()> {
        self.run(&["rollback", snapshot]).map(|_| ())
    }

    fn destroy(&self, snapshot: &str) -> NetconfResult<()> {
        self.run(&["destroy", snapshot]).map(|_| ())
    }
}

/// Parse tab-separated `name mountpoint` rows from `zfs list -H`
///
/// Rows whose mountpoint is not an absolute path (`none`, `legacy`, `-`)
/// are dropped.
pub fn parse_mounts(stdout: &str) -> Vec<DatasetMount> {
    stdout
        .lines()
        .filter_map(|line| {
            let (dataset, mountpoint) = line.split_once('\t')?;
            let mountpoint = mountpoint.trim_end_matches(['\t', '\r']);
            mountpoint.starts_with('/').then(|| DatasetMount {
                dataset: dataset.to_string(),
                mountpoint: PathBuf::from(mountpoint),
            })
        })
        .collect()
}

/// The dataset whose mountpoint is the longest ancestor of `dir`
pub fn resolve_dataset(mounts: &[DatasetMount], dir: &Path) -> Option<String> {
    mounts
        .iter()
        .filter(|m| dir.starts_with(&m.mountpoint))
        .max_by_key(|m| m.mountpoint.components().count())
        .map(|m| m.dataset.clone())
}
