//! Backup display formatting
//!
//! Formats backup records for terminal output in table and detail views.

use chrono::{DateTime, Duration, Utc};

use crate::backup::{BackupMethod, BackupRecord};

/// Format a list of backups as a table, newest first as given
pub fn format_backup_list(records: &[BackupRecord], now: DateTime<Utc>) -> String {
    if records.is_empty() {
        return "No backups found.".to_string();
    }

    let ids: Vec<String> = records
        .iter()
        .map(|r| r.id().map(|id| id.to_string()).unwrap_or_else(|| "?".into()))
        .collect();

    let id_width = ids.iter().map(String::len).max().unwrap_or(2).max(2);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<id_width$}  {:<8}  {:>5}  {:>5}  {}\n",
        "ID",
        "Strategy",
        "Age",
        "Files",
        "Reason",
        id_width = id_width,
    ));
    output.push_str(&format!(
        "{:-<id_width$}  {:-<8}  {:->5}  {:->5}  {:-<20}\n",
        "",
        "",
        "",
        "",
        "",
        id_width = id_width,
    ));

    for (record, id) in records.iter().zip(&ids) {
        let files = match record.strategy {
            BackupMethod::Snapshot => "-".to_string(),
            BackupMethod::Copy => record.files.len().to_string(),
        };

        output.push_str(&format!(
            "{:<id_width$}  {:<8}  {:>5}  {:>5}  {}\n",
            id,
            record.strategy,
            format_duration(now.signed_duration_since(record.timestamp)),
            files,
            record.reason,
            id_width = id_width,
        ));
    }

    output.push_str(&format!("\nTotal: {} backup(s)\n", records.len()));
    output
}

/// Format one backup record in detail
pub fn format_backup_details(record: &BackupRecord) -> String {
    let mut output = String::new();

    if let Some(id) = record.id() {
        output.push_str(&format!("Backup:   {}\n", id));
    }
    output.push_str(&format!(
        "Created:  {}\n",
        record.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output.push_str(&format!("Strategy: {}\n", record.strategy));
    output.push_str(&format!("Reason:   {}\n", record.reason));
    output.push_str(&format!("User:     {}\n", record.user));
    output.push_str(&format!("Host:     {}\n", record.hostname));

    if let Some(snapshot) = &record.snapshot_name {
        output.push_str(&format!("Snapshot: {}\n", snapshot));
    }

    if record.files.is_empty() {
        if record.snapshot_name.is_none() {
            output.push_str("Files:    (none)\n");
        }
    } else {
        output.push_str("Files:\n");
        for file in &record.files {
            output.push_str(&format!("  {}\n", file));
        }
    }

    output
}

/// Format a duration in human-readable form
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.num_seconds().max(0);

    if total_seconds < 60 {
        return format!("{}s", total_seconds);
    }

    let minutes = total_seconds / 60;
    if minutes < 60 {
        return format!("{}m", minutes);
    }

    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h", hours);
    }

    let days = hours / 24;
    if days < 30 {
        return format!("{}d", days);
    }

    let months = days / 30;
    format!("{}mo", months)
}
