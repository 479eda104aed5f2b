//! Custom error types for bsd-netconf
//!
//! This module defines the error hierarchy for the library using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for bsd-netconf operations
#[derive(Error, Debug)]
pub enum NetconfError {
    /// A configuration file exists but could not be read
    #[error("Read error: {0}")]
    Read(String),

    /// Structural or domain validation failed; carries every problem found
    #[error("Validation error: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Temp-file creation, write, or atomic replace failed
    #[error("Write error: {0}")]
    Write(String),

    /// Underlying snapshot or copy operation failed
    #[error("Backup error: {0}")]
    Backup(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Settings file problems
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors outside the read/write paths above
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),
}

impl NetconfError {
    /// Create a validation error from a single message
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Validation(vec![message.into()])
    }

    /// Create a "not found" error for wireless networks
    pub fn network_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Network",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for backups
    pub fn backup_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Backup",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Problems carried by a validation error, empty for any other kind
    pub fn problems(&self) -> &[String] {
        match self {
            Self::Validation(problems) => problems,
            _ => &[],
        }
    }
}

impl From<std::io::Error> for NetconfError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for NetconfError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for bsd-netconf operations
pub type NetconfResult<T> = Result<T, NetconfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = NetconfError::Write("disk full".into());
        assert_eq!(err.to_string(), "Write error: disk full");
    }

    #[test]
    fn test_validation_joins_problems() {
        let err = NetconfError::Validation(vec![
            "Duplicate key: hostname (appears 2 times)".into(),
            "Invalid defaultrouter IP: 300.1.1.1".into(),
        ]);
        assert_eq!(
            err.to_string(),
            "Validation error: Duplicate key: hostname (appears 2 times); Invalid defaultrouter IP: 300.1.1.1"
        );
        assert!(err.is_validation());
        assert_eq!(err.problems().len(), 2);
    }

    #[test]
    fn test_not_found_error() {
        let err = NetconfError::network_not_found("HomeNet");
        assert_eq!(err.to_string(), "Network not found: HomeNet");
        assert!(err.is_not_found());
        assert!(err.problems().is_empty());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: NetconfError = io_err.into();
        assert!(matches!(err, NetconfError::Io(_)));
    }
}
