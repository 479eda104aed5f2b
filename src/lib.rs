//! bsd-netconf - persistence and backup for BSD network configuration
//!
//! This library reads, edits and safely rewrites the files that hold a
//! FreeBSD host's network configuration, and keeps full-configuration
//! backups so a bad change can be rolled back.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Path resolution and persisted settings
//! - `error`: Custom error types
//! - `parser`: Comment-preserving `key=value` document model
//! - `rc_conf`: Interfaces, gateway, hostname and services in rc.conf
//! - `wpa`: Wireless networks in wpa_supplicant.conf
//! - `storage`: Atomic writes and metadata-preserving copies
//! - `backup`: ZFS snapshot or file-copy backups, `.bak` sidecars
//! - `cli`, `display`: The `netconf` command line
//!
//! # Example
//!
//! ```rust,ignore
//! use netconf::backup::BackupManager;
//! use netconf::config::{NetconfPaths, Settings};
//! use netconf::rc_conf::RcConf;
//!
//! let paths = NetconfPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//!
//! let mut rc = RcConf::load(paths.rc_conf())?;
//! rc.set_interface_static("em0", "192.168.1.10", "24", None)?;
//!
//! BackupManager::new(&paths, &settings).create("static address for em0")?;
//! rc.save(true)?;
//! ```

pub mod backup;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod parser;
pub mod rc_conf;
pub mod storage;
pub mod wpa;

pub use error::{NetconfError, NetconfResult};
