//! wpa_supplicant.conf handler
//!
//! The file is a list of global `key=value` settings followed by
//! `network={ ... }` blocks. Unlike rc.conf it is regenerated on save:
//! header comments, globals, then every block in order.
//!
//! Parsing keeps two states, top level and inside a block. Comments seen at
//! top level before the first global setting become the header; comments
//! right above a block belong to that block. Comments inside a block and
//! blank lines are not kept.

pub mod network;
pub mod secret;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::backup::sidecar::write_restricted_sidecar;
use crate::error::{NetconfError, NetconfResult};
use crate::storage::file_io::{read_text_optional, write_text_atomic};

pub use network::{KeyMgmt, NetworkSummary, WpaNetwork};
pub use secret::Psk;

/// Permissions for a file holding network keys
pub const WPA_FILE_MODE: u32 = 0o600;

/// The wpa_supplicant.conf file
#[derive(Debug, Clone)]
pub struct WpaSupplicantConf {
    path: PathBuf,
    pub ctrl_interface: Option<String>,
    pub ctrl_interface_group: Option<String>,
    pub update_config: i32,
    /// Global settings without a typed field
    pub other_settings: BTreeMap<String, String>,
    /// Comment lines at the top of the file
    pub header_comments: Vec<String>,
    networks: Vec<WpaNetwork>,
    backed_by_file: bool,
}

impl WpaSupplicantConf {
    /// Configuration with no networks, not yet backed by a file
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ctrl_interface: None,
            ctrl_interface_group: None,
            update_config: 1,
            other_settings: BTreeMap::new(),
            header_comments: Vec::new(),
            networks: Vec::new(),
            backed_by_file: false,
        }
    }

    /// Parse the file at `path`; a missing file gives an empty configuration
    pub fn load(path: impl Into<PathBuf>) -> NetconfResult<Self> {
        let path = path.into();

        match read_text_optional(&path)? {
            Some(text) => {
                let mut conf = Self::from_text(path, &text);
                conf.backed_by_file = true;
                info!(
                    "Loaded {} networks from {}",
                    conf.networks.len(),
                    conf.path.display()
                );
                Ok(conf)
            }
            None => {
                warn!("{} does not exist, starting empty", path.display());
                Ok(Self::empty(path))
            }
        }
    }

    /// Parse file content
    pub fn from_text(path: impl Into<PathBuf>, text: &str) -> Self {
        let mut conf = Self::empty(path);
        let mut pending_comments: Vec<String> = Vec::new();
        let mut current: Option<WpaNetwork> = None;
        let mut seen_global = false;

        for line in text.lines().map(str::trim) {
            if line.is_empty() {
                continue;
            }

            if let Some(comment) = line.strip_prefix('#') {
                if current.is_none() {
                    pending_comments.push(comment.trim().to_string());
                }
                continue;
            }

            if current.is_none() && is_block_open(line) {
                current = Some(WpaNetwork {
                    comments: std::mem::take(&mut pending_comments),
                    ..Default::default()
                });
                continue;
            }

            if let Some(network) = current.as_mut() {
                if line.starts_with('}') {
                    conf.networks.extend(current.take());
                } else if let Some((key, value)) = split_setting(line) {
                    network.apply_field(key, value);
                }
                continue;
            }

            if !seen_global {
                conf.header_comments.append(&mut pending_comments);
                seen_global = true;
            }
            if let Some((key, value)) = split_setting(line) {
                conf.apply_global(key, value);
            }
        }

        if let Some(network) = current {
            warn!(
                "Unterminated network block for {}",
                network.ssid.as_deref().unwrap_or("<no ssid>")
            );
            conf.networks.push(network);
        }
        if !seen_global {
            conf.header_comments.append(&mut pending_comments);
        }

        conf
    }

    fn apply_global(&mut self, key: &str, value: &str) {
        match key {
            "ctrl_interface" => self.ctrl_interface = Some(value.to_string()),
            "ctrl_interface_group" => self.ctrl_interface_group = Some(value.to_string()),
            "update_config" => self.update_config = value.parse().unwrap_or(1),
            _ => {
                self.other_settings.insert(key.to_string(), value.to_string());
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_backed_by_file(&self) -> bool {
        self.backed_by_file
    }

    pub fn networks(&self) -> &[WpaNetwork] {
        &self.networks
    }

    /// First network with this SSID
    pub fn network(&self, ssid: &str) -> Option<&WpaNetwork> {
        self.networks
            .iter()
            .find(|n| n.ssid.as_deref() == Some(ssid))
    }

    /// Add a network
    ///
    /// `security` is a label such as `WPA2-PSK`, `WPA3-SAE` or `NONE`. With
    /// no password, or an open label, the network is open and no key is kept.
    pub fn add(
        &mut self,
        ssid: &str,
        password: Option<&str>,
        security: &str,
        priority: i32,
        scan_ssid: bool,
    ) -> NetconfResult<()> {
        check_quotable("SSID", ssid)?;

        let mut network = WpaNetwork::new(ssid);
        network.priority = priority;
        network.scan_ssid = scan_ssid;

        network.key_mgmt = match password {
            Some(_) => KeyMgmt::from_security_label(security),
            None => KeyMgmt::None,
        };
        if !network.is_open() {
            if let Some(password) = password {
                check_quotable("Password", password)?;
                network.psk = Some(Psk::new(password));
            }
        }

        info!("Added network: {} ({})", ssid, network.key_mgmt);
        self.networks.push(network);
        Ok(())
    }

    /// Remove every network with this SSID; returns whether any was removed
    pub fn remove(&mut self, ssid: &str) -> bool {
        let before = self.networks.len();
        self.networks.retain(|n| n.ssid.as_deref() != Some(ssid));

        let removed = self.networks.len() < before;
        if removed {
            info!("Removed network: {}", ssid);
        } else {
            warn!("Network not found: {}", ssid);
        }
        removed
    }

    /// Change the password and/or priority of the first network with this SSID
    pub fn update(
        &mut self,
        ssid: &str,
        password: Option<&str>,
        priority: Option<i32>,
    ) -> NetconfResult<()> {
        if let Some(password) = password {
            check_quotable("Password", password)?;
        }

        let network = self
            .networks
            .iter_mut()
            .find(|n| n.ssid.as_deref() == Some(ssid))
            .ok_or_else(|| NetconfError::network_not_found(ssid))?;

        if let Some(password) = password {
            network.psk = Some(Psk::new(password));
        }
        if let Some(priority) = priority {
            network.priority = priority;
        }

        info!("Updated network: {}", ssid);
        Ok(())
    }

    pub fn list(&self) -> Vec<NetworkSummary> {
        self.networks.iter().map(WpaNetwork::summary).collect()
    }

    pub fn clear_networks(&mut self) {
        self.networks.clear();
        info!("Cleared all networks");
    }

    /// Every problem that would stop a save
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for ssid in self.networks.iter().filter_map(|n| n.ssid.as_deref()) {
            *counts.entry(ssid).or_default() += 1;
        }
        for (ssid, count) in counts.into_iter().filter(|(_, c)| *c > 1) {
            problems.push(format!("Duplicate SSID: {} (appears {} times)", ssid, count));
        }

        for (i, network) in self.networks.iter().enumerate() {
            let name = match network.ssid.as_deref() {
                Some(ssid) if !ssid.is_empty() => ssid.to_string(),
                _ => {
                    problems.push(format!("Network #{} has no SSID", i + 1));
                    format!("#{}", i + 1)
                }
            };

            if !network.key_mgmt.is_known() {
                problems.push(format!(
                    "Network {}: invalid key_mgmt: {}",
                    name, network.key_mgmt
                ));
            }

            let has_key = network.psk.as_ref().is_some_and(|p| !p.is_empty());
            if !network.is_open() && !has_key {
                problems.push(format!(
                    "Network {}: no password set for secured network",
                    name
                ));
            }
        }

        problems
    }

    /// The file content this configuration saves as
    pub fn to_text(&self) -> String {
        let mut out = String::new();

        for comment in &self.header_comments {
            out.push_str(&format!("# {}\n", comment));
        }
        if !self.header_comments.is_empty() {
            out.push('\n');
        }

        if let Some(ctrl) = &self.ctrl_interface {
            out.push_str(&format!("ctrl_interface={}\n", ctrl));
        }
        if let Some(group) = &self.ctrl_interface_group {
            out.push_str(&format!("ctrl_interface_group={}\n", group));
        }
        out.push_str(&format!("update_config={}\n", self.update_config));
        for (key, value) in &self.other_settings {
            out.push_str(&format!("{}={}\n", key, value));
        }

        for network in &self.networks {
            out.push('\n');
            out.push_str(&network.to_block());
            out.push('\n');
        }

        out
    }

    /// Validate, then write owner-only with an optional `.bak` sidecar
    pub fn save(&mut self, backup: bool) -> NetconfResult<()> {
        let problems = self.validate();
        if !problems.is_empty() {
            return Err(NetconfError::Validation(problems));
        }

        if backup && self.path.exists() {
            write_restricted_sidecar(&self.path, WPA_FILE_MODE)?;
        }

        write_text_atomic(&self.path, &self.to_text(), Some(WPA_FILE_MODE))?;
        self.backed_by_file = true;

        info!(
            "Wrote {} networks to {}",
            self.networks.len(),
            self.path.display()
        );
        Ok(())
    }
}

fn is_block_open(line: &str) -> bool {
    line.strip_prefix("network")
        .map(str::trim_start)
        .and_then(|rest| rest.strip_prefix('='))
        .map(str::trim_start)
        .is_some_and(|rest| rest.starts_with('{'))
}

fn split_setting(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    (!key.is_empty()).then(|| (key, value.trim()))
}

fn check_quotable(what: &str, value: &str) -> NetconfResult<()> {
    if value.is_empty() {
        return Err(NetconfError::invalid(format!("{} cannot be empty", what)));
    }
    if value.contains(['"', '\n']) {
        return Err(NetconfError::invalid(format!(
            "{} may not contain quotes or newlines",
            what
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SAMPLE: &str = "# wpa_supplicant configuration\n\
# managed by netconf\n\
ctrl_interface=/var/run/wpa_supplicant\n\
ctrl_interface_group=wheel\n\
update_config=1\n\
country=DE\n\
\n\
# Home network\n\
network={\n\
    ssid=\"A\"\n\
    psk=\"password-a\"\n\
    priority=10\n\
}\n\
\n\
network={\n\
    ssid=\"B\"\n\
    # inside comments are dropped\n\
    key_mgmt=NONE\n\
}\n\
\n\
network={\n\
    ssid=\"C\"\n\
    psk=\"password-c\"\n\
    key_mgmt=SAE\n\
    ieee80211w=2\n\
}\n";

    fn sample() -> WpaSupplicantConf {
        WpaSupplicantConf::from_text("/etc/wpa_supplicant.conf", SAMPLE)
    }

    fn ssids(conf: &WpaSupplicantConf) -> Vec<String> {
        conf.list().into_iter().filter_map(|n| n.ssid).collect()
    }

    #[test]
    fn test_parse_globals_and_header() {
        let conf = sample();

        assert_eq!(
            conf.header_comments,
            vec!["wpa_supplicant configuration", "managed by netconf"]
        );
        assert_eq!(conf.ctrl_interface.as_deref(), Some("/var/run/wpa_supplicant"));
        assert_eq!(conf.ctrl_interface_group.as_deref(), Some("wheel"));
        assert_eq!(conf.update_config, 1);
        assert_eq!(conf.other_settings["country"], "DE");
    }

    #[test]
    fn test_parse_networks() {
        let conf = sample();
        assert_eq!(ssids(&conf), vec!["A", "B", "C"]);

        let a = conf.network("A").unwrap();
        assert_eq!(a.comments, vec!["Home network"]);
        assert_eq!(a.psk.as_deref(), Some("password-a"));
        assert_eq!(a.priority, 10);

        assert!(conf.network("B").unwrap().is_open());
        assert!(conf.network("B").unwrap().comments.is_empty());

        let c = conf.network("C").unwrap();
        assert_eq!(c.key_mgmt, KeyMgmt::Sae);
        assert_eq!(c.other_fields["ieee80211w"], "2");
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut conf = sample();

        assert!(conf.remove("B"));
        assert_eq!(ssids(&conf), vec!["A", "C"]);
        assert!(!conf.remove("B"));
    }

    #[test]
    fn test_remove_all_matching() {
        let mut conf = sample();
        conf.add("A", Some("another-pass"), "WPA2-PSK", 0, false)
            .unwrap();

        assert!(conf.remove("A"));
        assert_eq!(ssids(&conf), vec!["B", "C"]);
    }

    #[test]
    fn test_add_modes() {
        let mut conf = WpaSupplicantConf::empty("/tmp/x");

        conf.add("Open", Some("ignored"), "NONE", 0, false).unwrap();
        conf.add("NoPass", None, "WPA2-PSK", 0, false).unwrap();
        conf.add("Wpa3", Some("password3"), "WPA3-SAE", 3, true).unwrap();
        conf.add("Wpa2", Some("password2"), "WPA2-PSK", 0, false).unwrap();

        let open = conf.network("Open").unwrap();
        assert!(open.is_open());
        assert!(open.psk.is_none());
        assert!(conf.network("NoPass").unwrap().is_open());

        let wpa3 = conf.network("Wpa3").unwrap();
        assert_eq!(wpa3.key_mgmt, KeyMgmt::Sae);
        assert!(wpa3.scan_ssid);
        assert_eq!(conf.network("Wpa2").unwrap().key_mgmt, KeyMgmt::WpaPsk);

        assert!(conf.add("", None, "NONE", 0, false).is_err());
        assert!(conf.add("Bad\"Name", None, "NONE", 0, false).is_err());
    }

    #[test]
    fn test_update() {
        let mut conf = sample();

        conf.update("A", None, Some(50)).unwrap();
        let a = conf.network("A").unwrap();
        assert_eq!(a.priority, 50);
        assert_eq!(a.psk.as_deref(), Some("password-a"));

        conf.update("C", Some("new-password"), None).unwrap();
        assert_eq!(conf.network("C").unwrap().psk.as_deref(), Some("new-password"));

        assert!(conf.update("Z", None, Some(1)).unwrap_err().is_not_found());
    }

    #[test]
    fn test_list_omits_secrets() {
        let conf = sample();
        let listed = format!("{:?}", conf.list());
        assert!(!listed.contains("password-a"));
        assert_eq!(conf.list()[0].priority, 10);
    }

    #[test]
    fn test_validate() {
        let mut conf = sample();
        assert!(conf.validate().is_empty());

        conf.add("A", Some("dup-password"), "WPA2-PSK", 0, false)
            .unwrap();
        let mut nameless = WpaNetwork::default();
        nameless.key_mgmt = KeyMgmt::parse("WPA-PSK WPA-EAP");
        conf.networks.push(nameless);

        let problems = conf.validate();
        assert_eq!(problems.len(), 4, "{:?}", problems);
        assert!(problems[0].starts_with("Duplicate SSID: A"));
        assert!(problems.iter().any(|p| p == "Network #5 has no SSID"));
        assert!(problems.iter().any(|p| p.contains("invalid key_mgmt")));
        assert!(problems.iter().any(|p| p.contains("no password")));
    }

    #[test]
    fn test_open_mode_drops_key_on_save() {
        let mut conf = WpaSupplicantConf::empty("/tmp/x");
        conf.add("Cafe", Some("was-secured"), "WPA2-PSK", 0, false)
            .unwrap();
        conf.networks[0].key_mgmt = KeyMgmt::None;

        let text = conf.to_text();
        assert!(text.contains("key_mgmt=NONE"));
        assert!(!text.contains("was-secured"));
        assert!(!text.contains("psk"));
    }

    #[test]
    fn test_to_text_layout() {
        let mut conf = WpaSupplicantConf::empty("/tmp/x");
        conf.ctrl_interface = Some("/var/run/wpa_supplicant".into());
        conf.add("Home", Some("password1"), "WPA2-PSK", 0, false)
            .unwrap();

        assert_eq!(
            conf.to_text(),
            "ctrl_interface=/var/run/wpa_supplicant\n\
update_config=1\n\
\n\
network={\n    ssid=\"Home\"\n    psk=\"password1\"\n}\n"
        );
    }

    #[test]
    fn test_reparse_is_stable() {
        let first = sample().to_text();
        let second = WpaSupplicantConf::from_text("/tmp/x", &first).to_text();
        assert_eq!(first, second);
    }

    #[test]
    fn test_comment_after_globals_not_header() {
        let text = "# header\nupdate_config=1\n# stray\nap_scan=1\n";
        let conf = WpaSupplicantConf::from_text("/tmp/x", text);
        assert_eq!(conf.header_comments, vec!["header"]);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let conf = WpaSupplicantConf::load(temp_dir.path().join("wpa_supplicant.conf")).unwrap();

        assert!(!conf.is_backed_by_file());
        assert!(conf.networks().is_empty());
        assert_eq!(conf.update_config, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_save_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("wpa_supplicant.conf");
        fs::write(&path, SAMPLE).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        let mut conf = WpaSupplicantConf::load(&path).unwrap();
        conf.remove("B");
        conf.save(true).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);

        let bak = temp_dir.path().join("wpa_supplicant.conf.bak");
        assert_eq!(fs::read_to_string(&bak).unwrap(), SAMPLE);
        assert_eq!(fs::metadata(&bak).unwrap().permissions().mode() & 0o777, 0o600);

        let reloaded = WpaSupplicantConf::load(&path).unwrap();
        assert_eq!(ssids(&reloaded), vec!["A", "C"]);
    }

    #[test]
    fn test_save_refuses_invalid() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("wpa_supplicant.conf");

        let mut conf = WpaSupplicantConf::load(&path).unwrap();
        conf.add("X", Some("pw123456"), "WPA2-PSK", 0, false).unwrap();
        conf.networks[0].psk = None;

        assert!(conf.save(false).unwrap_err().is_validation());
        assert!(!path.exists());
    }
}
