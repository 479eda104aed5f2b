//! File I/O utilities with atomic writes
//!
//! Provides safe file operations that won't corrupt configuration on failure.

use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::NetconfError;

/// Path of the transient file used while replacing `path`
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Read a text file, returning `None` if it doesn't exist
///
/// Anything other than "not found" is a `Read` error, including content
/// that is not valid UTF-8.
pub fn read_text_optional(path: &Path) -> Result<Option<String>, NetconfError> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(NetconfError::Read(format!(
            "Failed to read {}: {}",
            path.display(),
            e
        ))),
    }
}

/// Write text to a file atomically (write to temp, then rename)
///
/// The target is either completely replaced or left as it was. When `mode`
/// is given the temp file is created with those permission bits, so the new
/// content is never on disk with looser permissions.
pub fn write_text_atomic(path: &Path, contents: &str, mode: Option<u32>) -> Result<(), NetconfError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                NetconfError::Write(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    // Same directory as the target, so the rename stays on one filesystem
    let temp_path = temp_path_for(path);

    let result = write_temp(&temp_path, contents, mode).and_then(|()| {
        fs::rename(&temp_path, path).map_err(|e| {
            NetconfError::Write(format!(
                "Failed to replace {}: {}",
                path.display(),
                e
            ))
        })
    });

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }

    result
}

fn write_temp(temp_path: &Path, contents: &str, mode: Option<u32>) -> Result<(), NetconfError> {
    let file = create_fresh(temp_path, mode)
        .map_err(|e| NetconfError::Write(format!("Failed to create temp file: {}", e)))?;

    let mut writer = BufWriter::new(file);
    writer
        .write_all(contents.as_bytes())
        .map_err(|e| NetconfError::Write(format!("Failed to write temp file: {}", e)))?;

    writer
        .flush()
        .map_err(|e| NetconfError::Write(format!("Failed to flush data: {}", e)))?;

    // Sync to disk before rename
    writer
        .get_ref()
        .sync_all()
        .map_err(|e| NetconfError::Write(format!("Failed to sync data: {}", e)))?;

    Ok(())
}

/// Create `path` as a new file, replacing any stale one
///
/// A stale file is unlinked rather than truncated, so a reader holding it
/// open never sees the new content. With `mode` the file is created with
/// those permission bits before anything is written to it.
fn create_fresh(path: &Path, mode: Option<u32>) -> std::io::Result<File> {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    let mut options = File::options();
    options.write(true).create_new(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        if let Some(mode) = mode {
            options.mode(mode);
        }
    }
    #[cfg(not(unix))]
    let _ = mode;

    let file = options.open(path)?;

    // The umask may have cleared bits; the file is still empty here
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Some(mode) = mode {
            file.set_permissions(fs::Permissions::from_mode(mode))?;
        }
    }

    Ok(file)
}

/// Permission bits of an existing file, if it exists
#[cfg(unix)]
pub fn current_mode(path: &Path) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path).ok().map(|m| m.permissions().mode() & 0o7777)
}

/// Permission bits of an existing file, if it exists
#[cfg(not(unix))]
pub fn current_mode(_path: &Path) -> Option<u32> {
    None
}

/// Copy a file preserving its permissions and modification time
pub fn copy_preserving(source: &Path, dest: &Path) -> std::io::Result<()> {
    let metadata = fs::metadata(source)?;
    // fs::copy carries the permission bits over
    fs::copy(source, dest)?;
    let modified = metadata.modified()?;
    File::options().write(true).open(dest)?.set_modified(modified)?;
    Ok(())
}

/// Copy a file into a new file created with `mode`, keeping the mtime
///
/// Unlike `copy_preserving` the copy never carries the source's looser
/// permission bits, not even while it is being written.
pub fn copy_restricted(source: &Path, dest: &Path, mode: u32) -> std::io::Result<()> {
    let modified = fs::metadata(source)?.modified()?;
    let mut reader = File::open(source)?;
    let mut file = create_fresh(dest, Some(mode))?;
    std::io::copy(&mut reader, &mut file)?;
    file.sync_all()?;
    file.set_modified(modified)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_nonexistent_returns_none() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.conf");

        assert!(read_text_optional(&path).unwrap().is_none());
    }

    #[test]
    fn test_read_invalid_utf8_is_read_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("binary.conf");
        fs::write(&path, [0xff, 0xfe, 0x00, 0x80]).unwrap();

        let err = read_text_optional(&path).unwrap_err();
        assert!(matches!(err, NetconfError::Read(_)));
    }

    #[test]
    fn test_write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("rc.conf");

        write_text_atomic(&path, "hostname=\"box\"\n", None).unwrap();
        assert_eq!(
            read_text_optional(&path).unwrap().as_deref(),
            Some("hostname=\"box\"\n")
        );
    }

    #[test]
    fn test_atomic_write_no_temp_file_left() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("rc.conf");

        write_text_atomic(&path, "a=1\n", None).unwrap();

        assert!(path.exists());
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn test_write_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("etc").join("rc.conf");

        write_text_atomic(&path, "a=1\n", None).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_failed_rename_cleans_up_temp() {
        let temp_dir = TempDir::new().unwrap();
        // A non-empty directory cannot be replaced by a file
        let path = temp_dir.path().join("occupied");
        fs::create_dir_all(path.join("child")).unwrap();

        let err = write_text_atomic(&path, "a=1\n", None).unwrap_err();
        assert!(matches!(err, NetconfError::Write(_)));
        assert!(!temp_path_for(&path).exists());
        assert!(path.join("child").is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn test_write_with_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secret.conf");

        write_text_atomic(&path, "psk=\"x\"\n", Some(0o600)).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_stale_temp_file_is_not_reused() {
        use std::io::Read;
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secret.conf");
        let stale = temp_path_for(&path);
        fs::write(&stale, "old\n").unwrap();
        fs::set_permissions(&stale, fs::Permissions::from_mode(0o644)).unwrap();
        let mut reader = File::open(&stale).unwrap();

        write_text_atomic(&path, "psk=\"x\"\n", Some(0o600)).unwrap();

        let mut seen = String::new();
        reader.read_to_string(&mut seen).unwrap();
        assert_eq!(seen, "old\n");
        assert_eq!(
            fs::metadata(&path).unwrap().permissions().mode() & 0o777,
            0o600
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_restricted() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("wpa.conf");
        let dest = temp_dir.path().join("wpa.conf.bak");
        fs::write(&source, "psk=\"x\"\n").unwrap();
        fs::set_permissions(&source, fs::Permissions::from_mode(0o644)).unwrap();
        fs::write(&dest, "older\n").unwrap();
        fs::set_permissions(&dest, fs::Permissions::from_mode(0o644)).unwrap();

        copy_restricted(&source, &dest, 0o600).unwrap();

        assert_eq!(fs::read_to_string(&dest).unwrap(), "psk=\"x\"\n");
        assert_eq!(
            fs::metadata(&dest).unwrap().permissions().mode() & 0o777,
            0o600
        );
        assert_eq!(
            fs::metadata(&dest).unwrap().modified().unwrap(),
            fs::metadata(&source).unwrap().modified().unwrap()
        );
    }

    #[test]
    fn test_copy_preserving_keeps_mtime() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("source.conf");
        let dest = temp_dir.path().join("dest.conf");
        fs::write(&source, "a=1\n").unwrap();

        let old = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_600_000_000);
        File::options()
            .write(true)
            .open(&source)
            .unwrap()
            .set_modified(old)
            .unwrap();

        copy_preserving(&source, &dest).unwrap();

        assert_eq!(fs::read_to_string(&dest).unwrap(), "a=1\n");
        assert_eq!(fs::metadata(&dest).unwrap().modified().unwrap(), old);
    }
}
