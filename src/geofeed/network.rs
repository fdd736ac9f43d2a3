//! Network field normalization
//!
//! Geofeed rows may name either a CIDR block or a bare address. Bare
//! addresses are turned into single-host networks so every record carries
//! a canonical [`IpNet`].

use ipnet::{AddrParseError, IpNet};
use std::borrow::Cow;

/// Prefix length given to a bare IPv4 address
pub const IPV4_HOST_PREFIX: u8 = 32;

/// Prefix length given to a bare IPv6 address
pub const IPV6_HOST_PREFIX: u8 = 128;

/// Append the single-host prefix length to a bare address.
///
/// Strings that already carry a `/` are returned untouched.
pub fn with_host_prefix(raw: &str) -> Cow<'_, str> {
    if raw.contains('/') {
        Cow::Borrowed(raw)
    } else if raw.contains(':') {
        Cow::Owned(format!("{}/{}", raw, IPV6_HOST_PREFIX))
    } else {
        Cow::Owned(format!("{}/{}", raw, IPV4_HOST_PREFIX))
    }
}

/// Parse a geofeed network field into an [`IpNet`]
///
/// # Examples
///
/// ```
/// use geofeed_verifier::geofeed::network::normalize_network;
///
/// let net = normalize_network("192.0.2.1").unwrap();
/// assert_eq!(net.to_string(), "192.0.2.1/32");
///
/// let net = normalize_network("2001:db8::/32").unwrap();
/// assert_eq!(net.prefix_len(), 32);
/// ```
pub fn normalize_network(raw: &str) -> Result<IpNet, AddrParseError> {
    with_host_prefix(raw.trim()).parse::<IpNet>()
}
