//! Wireless network display formatting

use crate::wpa::NetworkSummary;

/// Format configured networks as a table, in file order
pub fn format_network_list(networks: &[NetworkSummary]) -> String {
    if networks.is_empty() {
        return "No networks configured.".to_string();
    }

    let ssid_width = networks
        .iter()
        .map(|n| n.ssid.as_deref().map_or(6, str::len))
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<ssid_width$}  {:<8}  {:>8}  {}\n",
        "SSID",
        "Security",
        "Priority",
        "Flags",
        ssid_width = ssid_width,
    ));
    output.push_str(&format!(
        "{:-<ssid_width$}  {:-<8}  {:->8}  {:-<16}\n",
        "",
        "",
        "",
        "",
        ssid_width = ssid_width,
    ));

    for network in networks {
        let mut flags = Vec::new();
        if network.scan_ssid {
            flags.push("hidden");
        }
        if network.disabled {
            flags.push("disabled");
        }

        output.push_str(&format!(
            "{:<ssid_width$}  {:<8}  {:>8}  {}\n",
            network.ssid.as_deref().unwrap_or("<none>"),
            network.key_mgmt.to_string(),
            network.priority,
            flags.join(","),
            ssid_width = ssid_width,
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wpa::KeyMgmt;

    #[test]
    fn test_format_network_list() {
        let networks = vec![
            NetworkSummary {
                ssid: Some("HomeNet".into()),
                key_mgmt: KeyMgmt::WpaPsk,
                priority: 10,
                scan_ssid: false,
                disabled: false,
            },
            NetworkSummary {
                ssid: Some("Hidden".into()),
                key_mgmt: KeyMgmt::None,
                priority: 0,
                scan_ssid: true,
                disabled: true,
            },
        ];

        let output = format_network_list(&networks);
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("HomeNet  WPA-PSK"));
        assert!(lines[3].ends_with("hidden,disabled"));
    }

    #[test]
    fn test_empty() {
        assert_eq!(format_network_list(&[]), "No networks configured.");
    }
}
