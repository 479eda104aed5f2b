//! Backup system for bsd-netconf
//!
//! Two layers of protection against a bad edit:
//!
//! - Full-configuration backups taken by `BackupManager` before every
//!   mutating command. When the configuration lives on ZFS these are
//!   snapshots of the dataset; otherwise the files are copied into a
//!   timestamp-named directory under the backup directory.
//! - A `.bak` sidecar written next to each file immediately before it is
//!   rewritten (see `sidecar`).
//!
//! # Retention Policy
//!
//! After each successful backup only the newest entries are kept:
//! 10 snapshots or 20 copy directories by default. Only snapshots carrying
//! our prefix are ever touched.
//!
//! # Example
//!
//! ```rust,ignore
//! use netconf::backup::BackupManager;
//! use netconf::config::{NetconfPaths, Settings};
//!
//! let paths = NetconfPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let manager = BackupManager::new(&paths, &settings);
//!
//! let id = manager.create("pre-change")?;
//! let result = manager.restore(&id)?;
//! println!("{}", result.summary());
//! ```

mod manager;
mod record;
mod restore;
pub mod sidecar;
pub mod snapshot;

pub use manager::{BackupManager, BackupStrategy};
pub use record::{BackupId, BackupMethod, BackupRecord};
pub use restore::RestoreResult;
pub use snapshot::{DatasetMount, SnapshotTool, ZfsCli};
