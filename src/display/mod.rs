//! Display formatting for terminal output
//!
//! Plain-text tables and detail views for the CLI.

pub mod backup;
pub mod rc;
pub mod wifi;

pub use backup::{format_backup_details, format_backup_list, format_duration};
pub use rc::{format_interfaces, format_settings};
pub use wifi::format_network_list;
