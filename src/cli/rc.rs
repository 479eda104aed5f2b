//! rc.conf CLI commands

use clap::{Subcommand, ValueEnum};

use super::{backup_before_change, print_problems};
use crate::config::paths::NetconfPaths;
use crate::config::settings::Settings;
use crate::display::{format_interfaces, format_settings};
use crate::error::{NetconfError, NetconfResult};
use crate::rc_conf::RcConf;

/// rc.conf subcommands
#[derive(Subcommand)]
pub enum RcCommands {
    /// Show all settings
    Show {
        /// Only interface configuration
        #[arg(short, long)]
        interfaces: bool,
    },

    /// Print one setting
    Get {
        /// Variable name
        key: String,
    },

    /// Set a variable (the value is stored quoted)
    Set {
        /// Variable name
        key: String,
        /// New value
        value: String,
    },

    /// Remove a variable
    Delete {
        /// Variable name
        key: String,
    },

    /// Configure an interface by DHCP
    Dhcp {
        /// Interface name (e.g. em0)
        interface: String,
    },

    /// Give an interface a fixed IPv4 address
    Static {
        /// Interface name (e.g. em0)
        interface: String,
        /// IPv4 address
        address: String,
        /// Netmask, dotted quad or prefix length
        netmask: String,
        /// Extra ifconfig options appended to the line
        #[arg(short, long)]
        options: Option<String>,
    },

    /// Remove an interface's configuration
    Unconfigure {
        /// Interface name
        interface: String,
    },

    /// Show or change the default gateway
    Gateway {
        /// New gateway address
        address: Option<String>,
        /// Remove the default gateway
        #[arg(long, conflicts_with = "address")]
        remove: bool,
    },

    /// Show or change the hostname
    Hostname {
        /// New hostname
        name: Option<String>,
    },

    /// Enable, disable or query a service
    Service {
        /// Service name (e.g. sshd)
        name: String,
        /// What to do
        #[arg(value_enum, default_value = "status")]
        action: ServiceAction,
    },

    /// Check rc.conf for duplicate keys and bad addresses
    Validate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ServiceAction {
    Enable,
    Disable,
    Status,
}

/// Handle an rc.conf command
pub fn handle_rc_command(
    paths: &NetconfPaths,
    settings: &Settings,
    cmd: RcCommands,
) -> NetconfResult<()> {
    let mut rc = RcConf::load(paths.rc_conf())?;

    match cmd {
        RcCommands::Show { interfaces } => {
            if interfaces {
                print!("{}", format_interfaces(&rc.interface_configs()));
            } else {
                print!("{}", format_settings(&rc.all()));
            }
            println!();
        }

        RcCommands::Get { key } => {
            let value = rc.get(&key).ok_or_else(|| setting_not_found(&key))?;
            println!("{}", value);
        }

        RcCommands::Set { key, value } => {
            rc.set(&key, &value)?;
            commit(paths, settings, &mut rc, &format!("set {}", key))?;
            println!("Set {}=\"{}\"", key, value);
        }

        RcCommands::Delete { key } => {
            if !rc.delete(&key) {
                return Err(setting_not_found(&key));
            }
            commit(paths, settings, &mut rc, &format!("delete {}", key))?;
            println!("Deleted {}", key);
        }

        RcCommands::Dhcp { interface } => {
            rc.set_interface_dhcp(&interface)?;
            commit(paths, settings, &mut rc, &format!("{} dhcp", interface))?;
            println!("Configured {} for DHCP", interface);
        }

        RcCommands::Static {
            interface,
            address,
            netmask,
            options,
        } => {
            rc.set_interface_static(&interface, &address, &netmask, options.as_deref())?;
            commit(paths, settings, &mut rc, &format!("{} static", interface))?;
            println!("Configured {}: {} netmask {}", interface, address, netmask);
        }

        RcCommands::Unconfigure { interface } => {
            if !rc.remove_interface_config(&interface) {
                return Err(NetconfError::NotFound {
                    entity_type: "Interface",
                    identifier: interface,
                });
            }
            commit(paths, settings, &mut rc, &format!("{} unconfigure", interface))?;
            println!("Removed configuration for {}", interface);
        }

        RcCommands::Gateway { address, remove } => {
            if remove {
                if !rc.remove_default_router() {
                    println!("No default gateway configured.");
                    return Ok(());
                }
                commit(paths, settings, &mut rc, "remove gateway")?;
                println!("Removed default gateway");
            } else if let Some(address) = address {
                rc.set_default_router(&address)?;
                commit(paths, settings, &mut rc, "set gateway")?;
                println!("Default gateway: {}", address);
            } else {
                match rc.default_router() {
                    Some(gateway) => println!("{}", gateway),
                    None => println!("No default gateway configured."),
                }
            }
        }

        RcCommands::Hostname { name } => match name {
            Some(name) => {
                rc.set_hostname(&name)?;
                commit(paths, settings, &mut rc, "set hostname")?;
                println!("Hostname: {}", name.trim());
            }
            None => match rc.hostname() {
                Some(hostname) => println!("{}", hostname),
                None => println!("No hostname configured."),
            },
        },

        RcCommands::Service { name, action } => match action {
            ServiceAction::Status => {
                let state = if rc.is_service_enabled(&name) {
                    "enabled"
                } else {
                    "disabled"
                };
                println!("{}: {}", name, state);
            }
            ServiceAction::Enable | ServiceAction::Disable => {
                let enable = action == ServiceAction::Enable;
                if enable {
                    rc.enable_service(&name)?;
                } else {
                    rc.disable_service(&name)?;
                }
                let verb = if enable { "enable" } else { "disable" };
                commit(paths, settings, &mut rc, &format!("{} {}", verb, name))?;
                println!("{}_enable=\"{}\"", name, if enable { "YES" } else { "NO" });
            }
        },

        RcCommands::Validate => {
            let problems = rc.validate();
            if !problems.is_empty() {
                print_problems(&problems);
                return Err(NetconfError::Validation(problems));
            }
            println!("{} is valid.", rc.path().display());
        }
    }

    Ok(())
}

/// Validate, take a full backup, then write with a `.bak` sidecar
fn commit(
    paths: &NetconfPaths,
    settings: &Settings,
    rc: &mut RcConf,
    change: &str,
) -> NetconfResult<()> {
    let problems = rc.validate();
    if !problems.is_empty() {
        return Err(NetconfError::Validation(problems));
    }

    backup_before_change(paths, settings, &format!("rc.conf: {}", change))?;
    rc.save(true)
}

fn setting_not_found(key: &str) -> NetconfError {
    NetconfError::NotFound {
        entity_type: "Setting",
        identifier: key.to_string(),
    }
}
