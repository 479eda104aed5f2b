use std::io::IsTerminal;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use netconf::cli::{handle_backup_command, handle_rc_command, handle_wifi_command};
use netconf::config::{paths::NetconfPaths, settings::Settings};

#[derive(Parser)]
#[command(
    name = "netconf",
    version,
    about = "Edit and back up BSD network configuration",
    long_about = "netconf edits rc.conf and wpa_supplicant.conf without disturbing \
                  comments or layout, and takes a full backup (ZFS snapshot or file \
                  copy) before every change."
)]
struct Cli {
    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interface, gateway, hostname and service settings in rc.conf
    #[command(subcommand)]
    Rc(netconf::cli::RcCommands),

    /// Wireless networks in wpa_supplicant.conf
    #[command(subcommand, alias = "wlan")]
    Wifi(netconf::cli::WifiCommands),

    /// Backup management commands
    #[command(subcommand)]
    Backup(netconf::cli::BackupCommands),

    /// Write the settings file and create the backup directory
    Init,

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // Initialize paths and settings
    let paths = NetconfPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    match cli.command {
        Some(Commands::Rc(cmd)) => {
            handle_rc_command(&paths, &settings, cmd)?;
        }
        Some(Commands::Wifi(cmd)) => {
            handle_wifi_command(&paths, &settings, cmd)?;
        }
        Some(Commands::Backup(cmd)) => {
            handle_backup_command(&paths, &settings, cmd)?;
        }
        Some(Commands::Init) => {
            println!("Initializing netconf under: {}", paths.root().display());
            paths.ensure_backup_dir()?;
            settings.save(&paths)?;
            println!("Settings written to: {}", paths.settings_file().display());
            println!("Backup directory:    {}", paths.backup_dir().display());
        }
        Some(Commands::Config) => {
            println!("netconf Configuration");
            println!("=====================");
            println!("Root:                {}", paths.root().display());
            println!("rc.conf:             {}", paths.rc_conf().display());
            println!("wpa_supplicant.conf: {}", paths.wpa_supplicant_conf().display());
            println!("Backup directory:    {}", paths.backup_dir().display());
            println!("Settings file:       {}", paths.settings_file().display());
            println!();
            println!("Settings:");
            println!("  Use snapshots:   {}", settings.use_snapshots);
            println!("  Snapshot prefix: {}", settings.snapshot_prefix);
            println!(
                "  Retention:       {} snapshot(s), {} copy backup(s)",
                settings.backup_retention.snapshot_keep, settings.backup_retention.copy_keep
            );
        }
        None => {
            println!("netconf - BSD network configuration");
            println!();
            println!("Run 'netconf --help' for usage information.");
        }
    }

    Ok(())
}
