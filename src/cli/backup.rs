//! Backup CLI commands
//!
//! Implements CLI commands for backup management.

use clap::Subcommand;
use tracing::warn;

use crate::backup::{BackupId, BackupManager, BackupMethod, BackupStrategy};
use crate::config::paths::NetconfPaths;
use crate::config::settings::Settings;
use crate::display::{format_backup_details, format_backup_list};
use crate::error::{NetconfError, NetconfResult};

/// Backup subcommands
#[derive(Subcommand)]
pub enum BackupCommands {
    /// Create a new backup
    Create {
        /// Why the backup is being taken
        #[arg(short, long, default_value = "manual backup")]
        reason: String,
    },

    /// List all available backups
    List {
        /// Show detailed information
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show information about a specific backup
    Info {
        /// Backup ID (use 'latest' for most recent)
        backup: String,
    },

    /// Restore from a backup
    Restore {
        /// Backup ID (use 'latest' for most recent)
        backup: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Delete a backup
    Delete {
        /// Backup ID
        backup: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Delete old backups according to retention policy
    Prune {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Show the backup strategy and retention policy
    Status,
}

/// Handle a backup command
pub fn handle_backup_command(
    paths: &NetconfPaths,
    settings: &Settings,
    cmd: BackupCommands,
) -> NetconfResult<()> {
    let manager = BackupManager::new(paths, settings);

    match cmd {
        BackupCommands::Create { reason } => {
            println!("Creating backup...");
            let id = manager.create(&reason)?;
            println!("Backup created: {}", id);
        }

        BackupCommands::List { verbose } => {
            let records = manager.list()?;

            if records.is_empty() {
                println!("No backups found.");
                println!("Create one with: netconf backup create");
                return Ok(());
            }

            if verbose {
                for record in &records {
                    println!("{}", format_backup_details(record));
                }
                println!("Total: {} backup(s)", records.len());
            } else {
                print!("{}", format_backup_list(&records, chrono::Utc::now()));
            }
        }

        BackupCommands::Info { backup } => {
            let id = resolve_backup_id(&manager, &backup)?;
            let record = manager.info(&id)?;
            print!("{}", format_backup_details(&record));
        }

        BackupCommands::Restore { backup, force } => {
            let id = resolve_backup_id(&manager, &backup)?;
            let record = manager.info(&id)?;

            println!("Backup Information");
            println!("==================");
            print!("{}", format_backup_details(&record));
            println!();

            if !force {
                if id.is_snapshot() {
                    println!("WARNING: This rolls the whole dataset back to the snapshot!");
                } else {
                    println!("WARNING: This will overwrite the current configuration files!");
                }
                println!("To proceed, run again with --force flag:");
                println!("  netconf backup restore {} --force", backup);
                return Ok(());
            }

            // A rollback refuses to cross newer snapshots, so only copies get
            // a safety backup first. Retention waits until the restore is
            // done so it cannot evict the backup being restored.
            let pre_restore = if id.is_snapshot() {
                None
            } else {
                println!("Creating backup of current configuration before restore...");
                let pre_restore = manager.capture(&format!("before restoring {}", id))?;
                println!("Pre-restore backup saved: {}", pre_restore);
                println!();
                Some(pre_restore)
            };

            println!("Restoring from backup...");
            let result = manager.restore(&id)?;

            if pre_restore.is_some() {
                if let Err(e) = manager.enforce_retention() {
                    warn!("Retention after restore failed: {}", e);
                }
            }

            println!("Restore complete!");
            println!("{}", result.summary());

            if !result.skipped.is_empty() {
                println!();
                println!("Skipped:");
                for skipped in &result.skipped {
                    println!("  {}", skipped);
                }
            }
        }

        BackupCommands::Delete { backup, force } => {
            let id = manager.parse_id(&backup)?;

            if !force {
                println!("This will permanently delete backup {}.", id);
                println!("To proceed, run again with --force flag:");
                println!("  netconf backup delete {} --force", backup);
                return Ok(());
            }

            manager.delete(&id)?;
            println!("Deleted backup: {}", id);
        }

        BackupCommands::Prune { force } => {
            let (method, keep) = match manager.strategy() {
                BackupStrategy::Snapshot { .. } => {
                    (BackupMethod::Snapshot, settings.backup_retention.snapshot_keep)
                }
                BackupStrategy::Copy => (BackupMethod::Copy, settings.backup_retention.copy_keep),
            };
            let current = manager
                .list()?
                .iter()
                .filter(|r| r.strategy == method)
                .count();
            let to_delete = current.saturating_sub(keep);

            if to_delete == 0 {
                println!("No backups to prune.");
                println!("Current retention policy: keep {} {} backup(s)", keep, method);
                println!("You have {} {} backup(s).", current, method);
                return Ok(());
            }

            println!("Prune Summary");
            println!("=============");
            println!("Retention policy: keep {} {} backup(s)", keep, method);
            println!("Current backups: {}", current);
            println!("To be deleted: {}", to_delete);
            println!();

            if !force {
                println!("To delete old backups, run again with --force flag:");
                println!("  netconf backup prune --force");
                return Ok(());
            }

            let deleted = manager.enforce_retention()?;
            println!("Deleted {} backup(s).", deleted.len());
        }

        BackupCommands::Status => {
            let count = manager.list()?.len();
            let retention = manager.retention();

            println!("Backup Status");
            println!("=============");
            match manager.strategy() {
                BackupStrategy::Snapshot { dataset } => {
                    println!("Strategy:         ZFS snapshot of {}", dataset)
                }
                BackupStrategy::Copy => println!("Strategy:         file copy"),
            }
            println!("Backup directory: {}", manager.backup_dir().display());
            println!(
                "Retention:        {} snapshot(s), {} copy backup(s)",
                retention.snapshot_keep, retention.copy_keep
            );
            println!("Backups:          {}", count);
        }
    }

    Ok(())
}

/// Resolve a backup argument, accepting `latest`
fn resolve_backup_id(manager: &BackupManager, backup: &str) -> NetconfResult<BackupId> {
    if backup.eq_ignore_ascii_case("latest") {
        return manager
            .list()?
            .iter()
            .find_map(|record| record.id())
            .ok_or_else(|| NetconfError::backup_not_found("latest"));
    }

    manager.parse_id(backup)
}
