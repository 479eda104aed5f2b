//! `network={ ... }` blocks of wpa_supplicant.conf

use std::collections::BTreeMap;
use std::fmt;

use super::secret::Psk;

/// Key management mode of a network
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum KeyMgmt {
    /// Open network, no key
    None,
    /// WPA/WPA2 personal
    #[default]
    WpaPsk,
    /// WPA/WPA2 enterprise
    WpaEap,
    /// WPA3 personal
    Sae,
    /// Anything else found in a file; fails validation
    Other(String),
}

impl KeyMgmt {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "NONE" => Self::None,
            "WPA-PSK" => Self::WpaPsk,
            "WPA-EAP" => Self::WpaEap,
            "SAE" => Self::Sae,
            other => Self::Other(other.to_string()),
        }
    }

    /// Pick the mode for a user-facing security label such as `WPA2-PSK`,
    /// `WPA3-SAE` or `NONE`
    pub fn from_security_label(label: &str) -> Self {
        let label = label.trim().to_ascii_uppercase();
        if label.is_empty() || label == "NONE" || label == "OPEN" {
            Self::None
        } else if label.contains("WPA3") || label.contains("SAE") {
            Self::Sae
        } else {
            Self::WpaPsk
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::None => "NONE",
            Self::WpaPsk => "WPA-PSK",
            Self::WpaEap => "WPA-EAP",
            Self::Sae => "SAE",
            Self::Other(s) => s,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Self::None)
    }

    /// One of the modes this tool knows how to write
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl fmt::Display for KeyMgmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configured wireless network
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WpaNetwork {
    pub ssid: Option<String>,
    pub psk: Option<Psk>,
    pub key_mgmt: KeyMgmt,
    /// Higher is preferred
    pub priority: i32,
    /// Probe for the network even when it does not broadcast its SSID
    pub scan_ssid: bool,
    pub disabled: bool,
    /// Fields without a typed accessor, values exactly as written
    pub other_fields: BTreeMap<String, String>,
    /// Comment lines directly above the block
    pub comments: Vec<String>,
}

/// What `list` reports about a network; never includes the key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkSummary {
    pub ssid: Option<String>,
    pub key_mgmt: KeyMgmt,
    pub priority: i32,
    pub scan_ssid: bool,
    pub disabled: bool,
}

impl WpaNetwork {
    pub fn new(ssid: impl Into<String>) -> Self {
        Self {
            ssid: Some(ssid.into()),
            ..Default::default()
        }
    }

    pub fn is_open(&self) -> bool {
        self.key_mgmt.is_open()
    }

    /// Apply one `key=value` line from inside the block
    pub(crate) fn apply_field(&mut self, key: &str, value: &str) {
        match key {
            "ssid" => self.ssid = Some(strip_quotes(value).to_string()),
            "psk" => self.psk = Some(Psk::new(strip_quotes(value))),
            "key_mgmt" => self.key_mgmt = KeyMgmt::parse(strip_quotes(value)),
            "priority" => self.priority = value.parse().unwrap_or(0),
            "scan_ssid" => self.scan_ssid = value.parse::<i64>().map_or(false, |n| n != 0),
            "disabled" => self.disabled = value == "1" || value.eq_ignore_ascii_case("true"),
            _ => {
                self.other_fields.insert(key.to_string(), value.to_string());
            }
        }
    }

    /// The block as written to the file, without a trailing newline
    ///
    /// An open network never carries a `psk` line, whatever is in memory.
    pub fn to_block(&self) -> String {
        let mut lines: Vec<String> = self.comments.iter().map(|c| format!("# {}", c)).collect();

        lines.push("network={".to_string());

        if let Some(ssid) = &self.ssid {
            lines.push(format!("    ssid=\"{}\"", ssid));
        }

        if self.is_open() {
            lines.push("    key_mgmt=NONE".to_string());
        } else {
            if let Some(psk) = &self.psk {
                lines.push(format!("    psk={}", psk.to_config_value()));
            }
            if self.key_mgmt != KeyMgmt::WpaPsk {
                lines.push(format!("    key_mgmt={}", self.key_mgmt));
            }
        }

        if self.priority != 0 {
            lines.push(format!("    priority={}", self.priority));
        }
        if self.scan_ssid {
            lines.push("    scan_ssid=1".to_string());
        }
        if self.disabled {
            lines.push("    disabled=1".to_string());
        }

        for (key, value) in &self.other_fields {
            lines.push(format!("    {}={}", key, value));
        }

        lines.push("}".to_string());
        lines.join("\n")
    }

    pub fn summary(&self) -> NetworkSummary {
        NetworkSummary {
            ssid: self.ssid.clone(),
            key_mgmt: self.key_mgmt.clone(),
            priority: self.priority,
            scan_ssid: self.scan_ssid,
            disabled: self.disabled,
        }
    }
}

fn strip_quotes(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_security_labels() {
        assert_eq!(KeyMgmt::from_security_label("NONE"), KeyMgmt::None);
        assert_eq!(KeyMgmt::from_security_label("open"), KeyMgmt::None);
        assert_eq!(KeyMgmt::from_security_label("WPA3-SAE"), KeyMgmt::Sae);
        assert_eq!(KeyMgmt::from_security_label("sae"), KeyMgmt::Sae);
        assert_eq!(KeyMgmt::from_security_label("WPA2-PSK"), KeyMgmt::WpaPsk);
        assert_eq!(KeyMgmt::from_security_label("WPA-PSK"), KeyMgmt::WpaPsk);
    }

    #[test]
    fn test_psk_block() {
        let mut network = WpaNetwork::new("HomeNet");
        network.psk = Some(Psk::new("secret123"));
        network.priority = 5;
        network.comments = vec!["Home".into()];

        assert_eq!(
            network.to_block(),
            "# Home\nnetwork={\n    ssid=\"HomeNet\"\n    psk=\"secret123\"\n    priority=5\n}"
        );
    }

    #[test]
    fn test_hex_psk_unquoted() {
        let hex = "0123456789abcdef".repeat(4);
        let mut network = WpaNetwork::new("Hex");
        network.psk = Some(Psk::new(hex.as_str()));

        assert!(network.to_block().contains(&format!("    psk={}\n", hex)));
    }

    #[test]
    fn test_open_block_never_has_psk() {
        let mut network = WpaNetwork::new("Cafe");
        network.psk = Some(Psk::new("left over"));
        network.key_mgmt = KeyMgmt::None;

        let block = network.to_block();
        assert!(block.contains("key_mgmt=NONE"));
        assert!(!block.contains("psk"));
    }

    #[test]
    fn test_sae_and_flags() {
        let mut network = WpaNetwork::new("Office");
        network.psk = Some(Psk::new("longpassword"));
        network.key_mgmt = KeyMgmt::Sae;
        network.scan_ssid = true;
        network.disabled = true;
        network
            .other_fields
            .insert("ieee80211w".into(), "2".into());

        assert_eq!(
            network.to_block(),
            "network={\n    ssid=\"Office\"\n    psk=\"longpassword\"\n    key_mgmt=SAE\n    \
             scan_ssid=1\n    disabled=1\n    ieee80211w=2\n}"
        );
    }

    #[test]
    fn test_apply_field() {
        let mut network = WpaNetwork::default();
        network.apply_field("ssid", "\"Lab\"");
        network.apply_field("psk", "\"pw12345678\"");
        network.apply_field("priority", "oops");
        network.apply_field("scan_ssid", "1");
        network.apply_field("identity", "\"user@example.org\"");

        assert_eq!(network.ssid.as_deref(), Some("Lab"));
        assert_eq!(network.psk.as_deref(), Some("pw12345678"));
        assert_eq!(network.priority, 0);
        assert!(network.scan_ssid);
        assert_eq!(network.other_fields["identity"], "\"user@example.org\"");
    }
}
