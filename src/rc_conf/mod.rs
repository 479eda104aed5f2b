//! rc.conf handler
//!
//! Typed access to interface, routing, hostname and service settings on top
//! of `ConfigDocument`. Values are stored double-quoted, the rc.conf
//! convention; getters return them with one pair of quotes removed.

pub mod validate;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{NetconfError, NetconfResult};
use crate::parser::ConfigDocument;

pub use validate::{validate_inet_address, validate_ipv4, validate_netmask, AddressError};

/// Key prefix of per-interface configuration
pub const IFCONFIG_PREFIX: &str = "ifconfig_";
/// Key prefix listing the wlan children of a wireless device
pub const WLANS_PREFIX: &str = "wlans_";
/// Key suffix of service switches
pub const ENABLE_SUFFIX: &str = "_enable";
pub const DEFAULT_ROUTER: &str = "defaultrouter";
pub const HOSTNAME: &str = "hostname";
/// Value asking for a DHCP-configured interface
pub const DHCP: &str = "DHCP";

/// Remove one pair of matching surrounding quotes
pub fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        if (first == b'"' || first == b'\'') && bytes[bytes.len() - 1] == first {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// The rc.conf file
#[derive(Debug, Clone)]
pub struct RcConf {
    doc: ConfigDocument,
}

impl RcConf {
    /// Parse rc.conf at `path`; a missing file gives an empty configuration
    pub fn load(path: impl Into<PathBuf>) -> NetconfResult<Self> {
        Ok(Self {
            doc: ConfigDocument::parse(path)?,
        })
    }

    pub fn from_document(doc: ConfigDocument) -> Self {
        Self { doc }
    }

    /// Underlying document, with values exactly as written
    pub fn document(&self) -> &ConfigDocument {
        &self.doc
    }

    pub fn path(&self) -> &Path {
        self.doc.path()
    }

    // Generic access

    /// Value of `key` without its quotes
    pub fn get(&self, key: &str) -> Option<&str> {
        self.doc.get(key).map(unquote)
    }

    /// Set `key` to the double-quoted `value`
    pub fn set(&mut self, key: &str, value: &str) -> NetconfResult<()> {
        check_key(key)?;
        if value.contains(['"', '\n']) {
            return Err(NetconfError::invalid(format!(
                "Value for {} may not contain quotes or newlines",
                key
            )));
        }

        self.doc.set(key, &format!("\"{}\"", value), None);
        Ok(())
    }

    pub fn delete(&mut self, key: &str) -> bool {
        self.doc.delete(key)
    }

    /// Every setting without quotes, sorted by key
    pub fn all(&self) -> BTreeMap<String, String> {
        self.doc
            .all()
            .into_iter()
            .map(|(key, value)| {
                let value = unquote(&value).to_string();
                (key, value)
            })
            .collect()
    }

    // Interfaces

    pub fn interface_config(&self, iface: &str) -> Option<&str> {
        self.get(&format!("{}{}", IFCONFIG_PREFIX, iface))
    }

    /// Interface name -> configuration for every `ifconfig_*` key
    pub fn interface_configs(&self) -> BTreeMap<String, String> {
        self.all()
            .into_iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(IFCONFIG_PREFIX)
                    .filter(|iface| !iface.is_empty())
                    .map(|iface| (iface.to_string(), value.clone()))
            })
            .collect()
    }

    /// Configure `iface` by DHCP
    pub fn set_interface_dhcp(&mut self, iface: &str) -> NetconfResult<()> {
        check_name("interface", iface)?;
        self.set(&format!("{}{}", IFCONFIG_PREFIX, iface), DHCP)?;
        info!("Set {} to DHCP", iface);
        Ok(())
    }

    /// Give `iface` a fixed address
    ///
    /// Nothing is changed unless both the address and the netmask are valid.
    pub fn set_interface_static(
        &mut self,
        iface: &str,
        address: &str,
        netmask: &str,
        options: Option<&str>,
    ) -> NetconfResult<()> {
        check_name("interface", iface)?;

        let mut problems = Vec::new();
        if let Err(e) = validate_ipv4(address) {
            problems.push(e.to_string());
        }
        if let Err(e) = validate_netmask(netmask) {
            problems.push(e.to_string());
        }
        if !problems.is_empty() {
            return Err(NetconfError::Validation(problems));
        }

        let mut value = format!("inet {} netmask {}", address, netmask);
        if let Some(extra) = options.map(str::trim).filter(|o| !o.is_empty()) {
            value.push(' ');
            value.push_str(extra);
        }

        self.set(&format!("{}{}", IFCONFIG_PREFIX, iface), &value)?;
        info!("Set {} to {}/{}", iface, address, netmask);
        Ok(())
    }

    pub fn remove_interface_config(&mut self, iface: &str) -> bool {
        self.delete(&format!("{}{}", IFCONFIG_PREFIX, iface))
    }

    /// Wireless device that `wlan` is created on, from the `wlans_*` keys
    pub fn wlan_parent(&self, wlan: &str) -> Option<String> {
        self.all().into_iter().find_map(|(key, value)| {
            let parent = key.strip_prefix(WLANS_PREFIX)?;
            value
                .split_whitespace()
                .any(|child| child == wlan)
                .then(|| parent.to_string())
        })
    }

    /// Create `wlan` on the wireless device `parent`
    pub fn set_wlan_parent(&mut self, parent: &str, wlan: &str) -> NetconfResult<()> {
        check_name("interface", parent)?;
        check_name("interface", wlan)?;
        self.set(&format!("{}{}", WLANS_PREFIX, parent), wlan)
    }

    // Routing

    pub fn default_router(&self) -> Option<&str> {
        self.get(DEFAULT_ROUTER)
    }

    pub fn set_default_router(&mut self, gateway: &str) -> NetconfResult<()> {
        validate_ipv4(gateway).map_err(|e| NetconfError::invalid(e.to_string()))?;
        self.set(DEFAULT_ROUTER, gateway)?;
        info!("Set default router to {}", gateway);
        Ok(())
    }

    pub fn remove_default_router(&mut self) -> bool {
        self.delete(DEFAULT_ROUTER)
    }

    // Hostname

    pub fn hostname(&self) -> Option<&str> {
        self.get(HOSTNAME)
    }

    pub fn set_hostname(&mut self, hostname: &str) -> NetconfResult<()> {
        let hostname = hostname.trim();
        if hostname.is_empty() {
            return Err(NetconfError::invalid("Hostname cannot be empty"));
        }
        self.set(HOSTNAME, hostname)?;
        info!("Set hostname to {}", hostname);
        Ok(())
    }

    // Services

    /// Whether `<service>_enable` is YES; anything else, or nothing, is NO
    pub fn is_service_enabled(&self, service: &str) -> bool {
        self.get(&format!("{}{}", service, ENABLE_SUFFIX))
            .unwrap_or("NO")
            .eq_ignore_ascii_case("YES")
    }

    pub fn enable_service(&mut self, service: &str) -> NetconfResult<()> {
        self.set_service(service, true)
    }

    pub fn disable_service(&mut self, service: &str) -> NetconfResult<()> {
        self.set_service(service, false)
    }

    fn set_service(&mut self, service: &str, enabled: bool) -> NetconfResult<()> {
        check_name("service", service)?;
        let value = if enabled { "YES" } else { "NO" };
        self.set(&format!("{}{}", service, ENABLE_SUFFIX), value)?;
        info!("Set {}{} to {}", service, ENABLE_SUFFIX, value);
        Ok(())
    }

    // Validation and saving

    /// Structural problems plus address syntax in gateway and interface values
    pub fn validate(&self) -> Vec<String> {
        let mut problems = self.doc.validate();

        // An empty defaultrouter means "no gateway"
        if let Some(gateway) = self.default_router().filter(|g| !g.trim().is_empty()) {
            if let Err(e) = validate_ipv4(gateway) {
                problems.push(format!("{}: {}", DEFAULT_ROUTER, e));
            }
        }

        for (iface, config) in self.interface_configs() {
            let mut tokens = config.split_whitespace();
            while let Some(token) = tokens.next() {
                if !token.eq_ignore_ascii_case("inet") {
                    continue;
                }
                match tokens.next() {
                    Some(address) => {
                        if let Err(e) = validate_inet_address(address) {
                            problems.push(format!("{}{}: {}", IFCONFIG_PREFIX, iface, e));
                        }
                    }
                    None => problems.push(format!(
                        "{}{}: inet without an address",
                        IFCONFIG_PREFIX, iface
                    )),
                }
            }
        }

        problems
    }

    /// Validate, then write with an optional `.bak` sidecar
    pub fn save(&mut self, backup: bool) -> NetconfResult<()> {
        let problems = self.validate();
        if !problems.is_empty() {
            return Err(NetconfError::Validation(problems));
        }
        self.doc.write(backup)
    }
}

fn check_key(key: &str) -> NetconfResult<()> {
    let valid = !key.is_empty()
        && !key.starts_with(|c: char| c.is_ascii_digit())
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(NetconfError::invalid(format!("Invalid variable name: '{}'", key)))
    }
}

fn check_name(kind: &str, name: &str) -> NetconfResult<()> {
    let valid = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(NetconfError::invalid(format!("Invalid {} name: '{}'", kind, name)))
    }
}
