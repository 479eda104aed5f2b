//! Path management for bsd-netconf
//!
//! Every managed file is resolved relative to a root directory so the whole
//! tool can run against a chroot, a mounted image, or a test fixture.
//!
//! ## Path Resolution Order
//!
//! 1. `NETCONF_ROOT` environment variable (if set)
//! 2. `/`

use std::path::{Path, PathBuf};

use crate::error::NetconfError;

/// Configuration files captured by a full backup, relative to `etc/`
pub const BACKUP_TARGETS: [&str; 5] = [
    "rc.conf",
    "rc.conf.local",
    "wpa_supplicant.conf",
    "resolv.conf",
    "dhclient.conf",
];

/// Manages all paths used by bsd-netconf
#[derive(Debug, Clone)]
pub struct NetconfPaths {
    /// Root that all system paths hang from
    root: PathBuf,
}

impl NetconfPaths {
    /// Create a new NetconfPaths instance
    ///
    /// Uses `NETCONF_ROOT` when set, the filesystem root otherwise.
    pub fn new() -> Result<Self, NetconfError> {
        let root = match std::env::var("NETCONF_ROOT") {
            Ok(custom) if !custom.trim().is_empty() => PathBuf::from(custom),
            Ok(_) => {
                return Err(NetconfError::Config(
                    "NETCONF_ROOT is set but empty".into(),
                ))
            }
            Err(_) => PathBuf::from("/"),
        };

        Ok(Self { root })
    }

    /// Create NetconfPaths with a custom root (useful for testing)
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    /// Get the root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the system configuration files
    pub fn etc_dir(&self) -> PathBuf {
        self.root.join("etc")
    }

    /// Get the path to rc.conf
    pub fn rc_conf(&self) -> PathBuf {
        self.etc_dir().join("rc.conf")
    }

    /// Get the path to wpa_supplicant.conf
    pub fn wpa_supplicant_conf(&self) -> PathBuf {
        self.etc_dir().join("wpa_supplicant.conf")
    }

    /// Get the directory for full-configuration backups
    pub fn backup_dir(&self) -> PathBuf {
        self.root.join("var").join("backups").join("bsd-netconf")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.root
            .join("usr")
            .join("local")
            .join("etc")
            .join("bsd-netconf.json")
    }

    /// Absolute paths of every file a full backup captures, in capture order
    pub fn backup_targets(&self) -> Vec<PathBuf> {
        let etc = self.etc_dir();
        BACKUP_TARGETS.iter().map(|name| etc.join(name)).collect()
    }

    /// Ensure the backup directory exists
    pub fn ensure_backup_dir(&self) -> Result<(), NetconfError> {
        std::fs::create_dir_all(self.backup_dir())
            .map_err(|e| NetconfError::Io(format!("Failed to create backup directory: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_custom_root() {
        let temp_dir = TempDir::new().unwrap();
        let paths = NetconfPaths::with_root(temp_dir.path().to_path_buf());

        assert_eq!(paths.root(), temp_dir.path());
        assert_eq!(paths.rc_conf(), temp_dir.path().join("etc").join("rc.conf"));
        assert_eq!(
            paths.backup_dir(),
            temp_dir.path().join("var/backups/bsd-netconf")
        );
    }

    #[test]
    fn test_backup_targets_order() {
        let paths = NetconfPaths::with_root(PathBuf::from("/"));
        let targets = paths.backup_targets();

        assert_eq!(targets.len(), 5);
        assert_eq!(targets[0], PathBuf::from("/etc/rc.conf"));
        assert_eq!(targets[2], PathBuf::from("/etc/wpa_supplicant.conf"));
    }

    #[test]
    fn test_ensure_backup_dir() {
        let temp_dir = TempDir::new().unwrap();
        let paths = NetconfPaths::with_root(temp_dir.path().to_path_buf());

        paths.ensure_backup_dir().unwrap();
        assert!(paths.backup_dir().is_dir());
    }
}
