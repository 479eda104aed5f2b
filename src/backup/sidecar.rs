//! Last-known-good `.bak` copies taken right before a file is rewritten

use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::error::{NetconfError, NetconfResult};
use crate::storage::file_io::{copy_preserving, copy_restricted};

/// `<path>.bak`
pub fn sidecar_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

/// Copy `path` to `<path>.bak`, preserving permissions and mtime
///
/// A failure here must stop the write it was guarding.
pub fn write_sidecar(path: &Path) -> NetconfResult<PathBuf> {
    sidecar_with(path, |bak| copy_preserving(path, bak))
}

/// Copy `path` to `<path>.bak`, created with `mode` instead of the
/// source's permission bits
pub fn write_restricted_sidecar(path: &Path, mode: u32) -> NetconfResult<PathBuf> {
    sidecar_with(path, |bak| copy_restricted(path, bak, mode))
}

fn sidecar_with(
    path: &Path,
    copy: impl FnOnce(&Path) -> std::io::Result<()>,
) -> NetconfResult<PathBuf> {
    let bak = sidecar_path(path);

    copy(&bak).map_err(|e| {
        error!("Failed to back up {}: {}", path.display(), e);
        NetconfError::Backup(format!(
            "Failed to copy {} to {}: {}",
            path.display(),
            bak.display(),
            e
        ))
    })?;

    info!("Created backup: {}", bak.display());
    Ok(bak)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_sidecar_path() {
        assert_eq!(
            sidecar_path(Path::new("/etc/rc.conf")),
            PathBuf::from("/etc/rc.conf.bak")
        );
    }

    #[test]
    fn test_write_sidecar_copies_content() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("rc.conf");
        fs::write(&path, "hostname=\"a\"\n").unwrap();

        let bak = write_sidecar(&path).unwrap();
        assert_eq!(fs::read_to_string(bak).unwrap(), "hostname=\"a\"\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_restricted_sidecar_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("wpa_supplicant.conf");
        fs::write(&path, "network={\n}\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        let bak = write_restricted_sidecar(&path, 0o600).unwrap();
        assert_eq!(fs::read_to_string(&bak).unwrap(), "network={\n}\n");
        assert_eq!(fs::metadata(&bak).unwrap().permissions().mode() & 0o777, 0o600);
    }

    #[test]
    fn test_missing_source_is_backup_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = write_sidecar(&temp_dir.path().join("absent.conf")).unwrap_err();
        assert!(matches!(err, NetconfError::Backup(_)));
    }
}
