//! rc.conf display formatting

use std::collections::BTreeMap;

/// Format `key=value` pairs aligned on the `=`
pub fn format_settings(settings: &BTreeMap<String, String>) -> String {
    if settings.is_empty() {
        return "No settings found.".to_string();
    }

    let key_width = settings.keys().map(String::len).max().unwrap_or(0);

    settings
        .iter()
        .map(|(key, value)| format!("{:<key_width$} = {}\n", key, value, key_width = key_width))
        .collect()
}

/// Format interface configurations as a table
pub fn format_interfaces(interfaces: &BTreeMap<String, String>) -> String {
    if interfaces.is_empty() {
        return "No interfaces configured.".to_string();
    }

    let name_width = interfaces.keys().map(String::len).max().unwrap_or(9).max(9);

    let mut output = format!(
        "{:<name_width$}  {}\n{:-<name_width$}  {:-<24}\n",
        "Interface",
        "Configuration",
        "",
        "",
        name_width = name_width,
    );
    for (name, config) in interfaces {
        output.push_str(&format!(
            "{:<name_width$}  {}\n",
            name,
            config,
            name_width = name_width
        ));
    }
    output
}
