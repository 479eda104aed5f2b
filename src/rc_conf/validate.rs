//! Address syntax checks for rc.conf values

use std::fmt;
use std::net::Ipv4Addr;

/// Why an address or netmask was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    InvalidAddress(String),
    InvalidNetmask(String),
    NonContiguousNetmask(String),
    PrefixOutOfRange(u32),
}

impl fmt::Display for AddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAddress(s) => write!(f, "Invalid IPv4 address: {}", s),
            Self::InvalidNetmask(s) => write!(f, "Invalid netmask: {}", s),
            Self::NonContiguousNetmask(s) => {
                write!(f, "Invalid netmask: {} (bits are not contiguous)", s)
            }
            Self::PrefixOutOfRange(n) => write!(f, "Invalid prefix length: {} (must be 0-32)", n),
        }
    }
}

impl std::error::Error for AddressError {}

/// Four dot-separated octets, 0-255 each, nothing else
pub fn validate_ipv4(s: &str) -> Result<Ipv4Addr, AddressError> {
    s.parse::<Ipv4Addr>()
        .map_err(|_| AddressError::InvalidAddress(s.to_string()))
}

/// A prefix length `0`-`32` or a contiguous dotted-quad mask
///
/// Returns the prefix length either way.
pub fn validate_netmask(s: &str) -> Result<u32, AddressError> {
    if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
        return validate_prefix_len(s);
    }

    let mask = u32::from(
        s.parse::<Ipv4Addr>()
            .map_err(|_| AddressError::InvalidNetmask(s.to_string()))?,
    );

    // Ones from the top, then zeros to the bottom
    if mask.leading_ones() + mask.trailing_zeros() != 32 {
        return Err(AddressError::NonContiguousNetmask(s.to_string()));
    }

    Ok(mask.leading_ones())
}

fn validate_prefix_len(s: &str) -> Result<u32, AddressError> {
    let len: u32 = s
        .parse()
        .map_err(|_| AddressError::InvalidNetmask(s.to_string()))?;
    if len > 32 {
        return Err(AddressError::PrefixOutOfRange(len));
    }
    Ok(len)
}

/// An address with an optional `/prefix`, as it may follow `inet`
pub fn validate_inet_address(s: &str) -> Result<Ipv4Addr, AddressError> {
    match s.split_once('/') {
        Some((address, prefix)) => {
            let address = validate_ipv4(address)?;
            if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_digit()) {
                return Err(AddressError::InvalidAddress(s.to_string()));
            }
            validate_prefix_len(prefix)?;
            Ok(address)
        }
        None => validate_ipv4(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv4_table() {
        let cases = [
            ("192.168.1.1", true),
            ("0.0.0.0", true),
            ("255.255.255.255", true),
            ("256.1.1.1", false),
            ("192.168.1", false),
            ("192.168.1.1.1", false),
            ("192.168.1.1 ", false),
            ("a.b.c.d", false),
            ("", false),
        ];

        for (input, valid) in cases {
            assert_eq!(validate_ipv4(input).is_ok(), valid, "address {:?}", input);
        }
    }

    #[test]
    fn test_netmask_table() {
        let cases = [
            ("255.255.255.0", Some(24)),
            ("255.255.0.0", Some(16)),
            ("0.0.0.0", Some(0)),
            ("255.255.255.255", Some(32)),
            ("255.255.255.128", Some(25)),
            ("24", Some(24)),
            ("0", Some(0)),
            ("32", Some(32)),
            ("255.255.0.255", None),
            ("255.0.255.0", None),
            ("33", None),
            ("99999999999", None),
            ("255.255.255", None),
            ("", None),
        ];

        for (input, expected) in cases {
            assert_eq!(validate_netmask(input).ok(), expected, "netmask {:?}", input);
        }
    }

    #[test]
    fn test_non_contiguous_reason() {
        assert_eq!(
            validate_netmask("255.255.0.255"),
            Err(AddressError::NonContiguousNetmask("255.255.0.255".into()))
        );
    }

    #[test]
    fn test_inet_address_with_prefix() {
        assert!(validate_inet_address("10.0.0.5/24").is_ok());
        assert!(validate_inet_address("10.0.0.5").is_ok());
        assert!(validate_inet_address("10.0.0.5/33").is_err());
        assert!(validate_inet_address("10.0.0.5/").is_err());
        assert!(validate_inet_address("10.0.0.256/24").is_err());
    }
}
