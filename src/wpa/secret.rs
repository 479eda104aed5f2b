//! Pre-shared keys held in memory
//!
//! The key is wiped when the value is dropped and never shows up in Debug
//! or Display output.

use std::fmt;
use std::ops::Deref;

use zeroize::Zeroizing;

/// Length of a pre-computed PSK (256 bits, hex encoded)
pub const HEX_PSK_LEN: usize = 64;

/// A WPA passphrase or hex PSK that zeros its contents on drop
#[derive(Clone, PartialEq, Eq)]
pub struct Psk {
    inner: Zeroizing<String>,
}

impl Psk {
    pub fn new(s: impl Into<String>) -> Self {
        Self {
            inner: Zeroizing::new(s.into()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Whether this is a pre-computed key rather than a passphrase
    ///
    /// wpa_supplicant takes those unquoted.
    pub fn is_hex(&self) -> bool {
        self.inner.len() == HEX_PSK_LEN && self.inner.chars().all(|c| c.is_ascii_hexdigit())
    }

    /// `psk=` value as it appears in the file
    pub fn to_config_value(&self) -> String {
        if self.is_hex() {
            self.as_str().to_string()
        } else {
            format!("\"{}\"", self.as_str())
        }
    }
}

impl Deref for Psk {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl From<String> for Psk {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for Psk {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// Don't print the contents in Debug output
impl fmt::Debug for Psk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Psk").field("len", &self.inner.len()).finish()
    }
}

impl fmt::Display for Psk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED {} bytes]", self.inner.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_and_display_redacted() {
        let psk = Psk::new("hunter22");
        assert!(!format!("{:?}", psk).contains("hunter22"));
        assert_eq!(psk.to_string(), "[REDACTED 8 bytes]");
        assert_eq!(psk.as_str(), "hunter22");
    }

    #[test]
    fn test_hex_detection() {
        let hex = "a".repeat(64);
        assert!(Psk::new(hex.as_str()).is_hex());
        assert_eq!(Psk::new(hex.as_str()).to_config_value(), hex);

        assert!(!Psk::new("g".repeat(64)).is_hex());
        assert!(!Psk::new("a".repeat(63)).is_hex());
        assert_eq!(Psk::new("passphrase").to_config_value(), "\"passphrase\"");
    }
}
