//! Backup metadata and identifiers

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{NetconfError, NetconfResult};

/// Format of copy-backup directory names and snapshot suffixes
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Metadata file written inside every copy-backup directory
pub const METADATA_FILE: &str = "backup.json";

/// How a backup was captured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupMethod {
    /// ZFS snapshot of the dataset holding the configuration files
    Snapshot,
    /// Plain copies of the configuration files
    Copy,
}

impl fmt::Display for BackupMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Snapshot => write!(f, "snapshot"),
            Self::Copy => write!(f, "copy"),
        }
    }
}

/// One point-in-time capture; never modified after creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupRecord {
    /// When the backup was created
    pub timestamp: DateTime<Utc>,
    /// Strategy used
    pub strategy: BackupMethod,
    /// Basenames of the files actually copied (empty for snapshots)
    #[serde(default)]
    pub files: Vec<String>,
    /// Human-supplied reason
    #[serde(default)]
    pub reason: String,
    /// Operating user
    #[serde(default)]
    pub user: String,
    /// Host the backup was taken on
    #[serde(default)]
    pub hostname: String,
    /// Full snapshot name, for snapshot backups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_name: Option<String>,
    /// Backup directory name, for copy backups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
}

impl BackupRecord {
    /// Identifier that `restore` and `delete` accept for this record
    pub fn id(&self) -> Option<BackupId> {
        match self.strategy {
            BackupMethod::Snapshot => self.snapshot_name.clone().map(BackupId::Snapshot),
            BackupMethod::Copy => self.directory.clone().map(BackupId::Copy),
        }
    }
}

/// A parsed backup identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BackupId {
    /// Full snapshot name, `dataset@prefix-YYYYmmdd-HHMMSS`
    Snapshot(String),
    /// Copy-backup directory name, `YYYYmmdd-HHMMSS[-NN]`
    Copy(String),
}

impl BackupId {
    /// Decide what kind of backup a user-supplied identifier refers to
    ///
    /// Anything carrying the `@prefix-` marker is a snapshot. Everything else
    /// must look like a copy-backup directory name, which also keeps path
    /// separators out of later filesystem operations.
    pub fn parse(raw: &str, prefix: &str) -> NetconfResult<Self> {
        let raw = raw.trim();
        if raw.contains(&snapshot_marker(prefix)) {
            return Ok(Self::Snapshot(raw.to_string()));
        }
        if is_backup_dir_name(raw) {
            return Ok(Self::Copy(raw.to_string()));
        }
        Err(NetconfError::invalid(format!(
            "Not a backup identifier: '{}'",
            raw
        )))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Snapshot(name) | Self::Copy(name) => name,
        }
    }

    pub fn is_snapshot(&self) -> bool {
        matches!(self, Self::Snapshot(_))
    }
}

impl fmt::Display for BackupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `@prefix-`, the piece that marks a snapshot name as ours
pub fn snapshot_marker(prefix: &str) -> String {
    format!("@{}-", prefix)
}

/// Whether `name` is `YYYYmmdd-HHMMSS` optionally followed by `-NN`
pub fn is_backup_dir_name(name: &str) -> bool {
    if !name.is_ascii() {
        return false;
    }

    let (stamp, suffix) = match name.len() {
        15 => (name, None),
        18 => (&name[..15], Some(&name[15..])),
        _ => return false,
    };

    if NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).is_err() {
        return false;
    }

    match suffix {
        None => true,
        Some(s) => {
            s.starts_with('-') && s[1..].chars().all(|c| c.is_ascii_digit())
        }
    }
}

/// Name of the user running the tool, from the password database
#[cfg(unix)]
pub fn current_user() -> String {
    use nix::unistd::{getuid, User};

    let uid = getuid();
    match User::from_uid(uid) {
        Ok(Some(user)) => user.name,
        _ => uid.to_string(),
    }
}

/// Name of the user running the tool
#[cfg(not(unix))]
pub fn current_user() -> String {
    std::env::var("USERNAME").unwrap_or_else(|_| "unknown".to_string())
}

/// Hostname of this machine
#[cfg(unix)]
pub fn current_hostname() -> String {
    nix::unistd::gethostname()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Hostname of this machine
#[cfg(not(unix))]
pub fn current_hostname() -> String {
    std::env::var("COMPUTERNAME").unwrap_or_else(|_| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_current_user_ignores_environment() {
        let name = current_user();
        assert!(!name.is_empty());
        assert!(!name.contains(char::is_whitespace));
    }

    #[test]
    fn test_dir_name_shapes() {
        assert!(is_backup_dir_name("20251215-100000"));
        assert!(is_backup_dir_name("20251215-100000-03"));
        assert!(!is_backup_dir_name("20251315-100000"));
        assert!(!is_backup_dir_name("20251215-100000-0x"));
        assert!(!is_backup_dir_name("../../etc"));
        assert!(!is_backup_dir_name("snapshot-20251215-100000.json"));
    }

    #[test]
    fn test_parse_id() {
        let snap = BackupId::parse("zroot/ROOT/default@netconf-20251215-100000", "netconf").unwrap();
        assert!(snap.is_snapshot());

        let copy = BackupId::parse("20251215-100000", "netconf").unwrap();
        assert_eq!(copy, BackupId::Copy("20251215-100000".into()));

        let err = BackupId::parse("../etc", "netconf").unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_other_prefix_is_not_snapshot() {
        let err = BackupId::parse("zroot@other-20251215-100000", "netconf").unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_record_json_shape() {
        let record = BackupRecord {
            timestamp: "2025-12-15T10:00:00Z".parse().unwrap(),
            strategy: BackupMethod::Copy,
            files: vec!["rc.conf".into(), "resolv.conf".into()],
            reason: "Test backup".into(),
            user: "root".into(),
            hostname: "fw1".into(),
            snapshot_name: None,
            directory: Some("20251215-100000".into()),
        };

        let json: serde_json::Value = serde_json::to_value(&record).unwrap();
        assert_eq!(json["strategy"], "copy");
        assert_eq!(json["reason"], "Test backup");
        assert_eq!(json["files"].as_array().unwrap().len(), 2);

        let back: BackupRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back.id(), Some(BackupId::Copy("20251215-100000".into())));
    }

    #[test]
    fn test_record_tolerates_missing_fields() {
        let json = r#"{"timestamp":"2025-12-15T10:00:00Z","strategy":"snapshot","snapshot_name":"z@netconf-20251215-100000"}"#;
        let record: BackupRecord = serde_json::from_str(json).unwrap();

        assert!(record.files.is_empty());
        assert_eq!(
            record.id(),
            Some(BackupId::Snapshot("z@netconf-20251215-100000".into()))
        );
    }
}
