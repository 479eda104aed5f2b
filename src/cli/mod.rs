//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the library.

pub mod backup;
pub mod rc;
pub mod wifi;

pub use backup::{handle_backup_command, BackupCommands};
pub use rc::{handle_rc_command, RcCommands, ServiceAction};
pub use wifi::{handle_wifi_command, WifiCommands};

use crate::backup::{BackupId, BackupManager};
use crate::config::paths::NetconfPaths;
use crate::config::settings::Settings;
use crate::error::NetconfResult;

/// Take a full backup ahead of a change
///
/// An error here must stop the change.
pub(crate) fn backup_before_change(
    paths: &NetconfPaths,
    settings: &Settings,
    reason: &str,
) -> NetconfResult<BackupId> {
    let id = BackupManager::new(paths, settings).create(reason)?;
    println!("Backup created: {}", id);
    Ok(id)
}

pub(crate) fn print_problems(problems: &[String]) {
    println!("Found {} problem(s):", problems.len());
    for problem in problems {
        println!("  - {}", problem);
    }
}
