//! Wireless network CLI commands

use clap::Subcommand;

use super::{backup_before_change, print_problems};
use crate::config::paths::NetconfPaths;
use crate::config::settings::Settings;
use crate::display::format_network_list;
use crate::error::{NetconfError, NetconfResult};
use crate::wpa::WpaSupplicantConf;

/// Wireless network subcommands
#[derive(Subcommand)]
pub enum WifiCommands {
    /// List configured networks
    List,

    /// Add a network
    Add {
        /// Network SSID
        ssid: String,
        /// Passphrase; leave out for an open network
        #[arg(short, long, env = "NETCONF_WIFI_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// Security type (WPA2-PSK, WPA3-SAE, NONE)
        #[arg(short, long, default_value = "WPA2-PSK")]
        security: String,
        /// Connection priority, higher is preferred
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        priority: i32,
        /// The network does not broadcast its SSID
        #[arg(long)]
        hidden: bool,
    },

    /// Remove every network with this SSID
    Remove {
        /// Network SSID
        ssid: String,
    },

    /// Change a network's passphrase or priority
    Update {
        /// Network SSID
        ssid: String,
        /// New passphrase
        #[arg(short, long, env = "NETCONF_WIFI_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// New priority
        #[arg(long, allow_negative_numbers = true)]
        priority: Option<i32>,
    },

    /// Check wpa_supplicant.conf for problems
    Validate,
}

/// Handle a wireless network command
pub fn handle_wifi_command(
    paths: &NetconfPaths,
    settings: &Settings,
    cmd: WifiCommands,
) -> NetconfResult<()> {
    let mut conf = WpaSupplicantConf::load(paths.wpa_supplicant_conf())?;

    match cmd {
        WifiCommands::List => {
            println!("{}", format_network_list(&conf.list()));
        }

        WifiCommands::Add {
            ssid,
            password,
            security,
            priority,
            hidden,
        } => {
            if conf.network(&ssid).is_some() {
                return Err(NetconfError::invalid(format!(
                    "Network '{}' already exists; use 'netconf wifi update'",
                    ssid
                )));
            }

            conf.add(&ssid, password.as_deref(), &security, priority, hidden)?;
            commit(paths, settings, &mut conf, &format!("add {}", ssid))?;

            let mode = conf
                .network(&ssid)
                .map(|n| n.key_mgmt.to_string())
                .unwrap_or_default();
            println!("Added network: {} ({})", ssid, mode);
        }

        WifiCommands::Remove { ssid } => {
            if !conf.remove(&ssid) {
                return Err(NetconfError::network_not_found(ssid));
            }
            commit(paths, settings, &mut conf, &format!("remove {}", ssid))?;
            println!("Removed network: {}", ssid);
        }

        WifiCommands::Update {
            ssid,
            password,
            priority,
        } => {
            if password.is_none() && priority.is_none() {
                return Err(NetconfError::invalid(
                    "Nothing to update: give --password and/or --priority",
                ));
            }

            conf.update(&ssid, password.as_deref(), priority)?;
            commit(paths, settings, &mut conf, &format!("update {}", ssid))?;
            println!("Updated network: {}", ssid);
        }

        WifiCommands::Validate => {
            let problems = conf.validate();
            if !problems.is_empty() {
                print_problems(&problems);
                return Err(NetconfError::Validation(problems));
            }
            println!("{} is valid.", conf.path().display());
        }
    }

    Ok(())
}

/// Validate, take a full backup, then write with a `.bak` sidecar
fn commit(
    paths: &NetconfPaths,
    settings: &Settings,
    conf: &mut WpaSupplicantConf,
    change: &str,
) -> NetconfResult<()> {
    let problems = conf.validate();
    if !problems.is_empty() {
        return Err(NetconfError::Validation(problems));
    }

    backup_before_change(paths, settings, &format!("wpa_supplicant.conf: {}", change))?;
    conf.save(true)
}
