//! Line-preserving parser for shell-style `key=value` files
//!
//! Comments, blank lines, ordering and unrecognised lines survive a
//! parse/write cycle untouched. Only lines whose values change are
//! regenerated.

pub mod document;
pub mod line;

pub use document::ConfigDocument;
pub use line::{ConfigLine, LineKind};
