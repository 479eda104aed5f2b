//! Configuration module for bsd-netconf
//!
//! This module provides configuration management including:
//! - Root-relative path resolution for every managed file
//! - User settings persistence
//! - Backup retention preferences

pub mod paths;
pub mod settings;

pub use paths::NetconfPaths;
pub use settings::Settings;
