//! Storage layer for bsd-netconf
//!
//! Provides atomic text writes, optional reads of first-run files, and
//! metadata-preserving copies.

pub mod file_io;

pub use file_io::{copy_preserving, read_text_optional, write_text_atomic};
