// Copyright (C) 2020 Matthew Waters <matthew@centricular.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Network addresses
//!
//! The address attributes written by a [`MessageBuilder`](crate::builder::MessageBuilder)
//! accept anything implementing [`SocketAddress`]:
//!
//!  - [`std::net::SocketAddr`]
//!  - [`Address`], an address that may also be unset
//!  - [`RawSocketAddr`], a family code, port and address bytes as received from a socket API

use std::net::{AddrParseError, IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::str::FromStr;

use smallvec::SmallVec;

use crate::message::StunWriteError;

/// The address family of a socket address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    /// IPv4
    IPV4,
    /// IPv6
    IPV6,
    /// No address has been set
    Unspecified,
    /// Any other (platform specific) family code
    Other(u16),
}

impl AddressFamily {
    /// The family value used in STUN address attributes
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_msg::address::AddressFamily;
    /// assert_eq!(AddressFamily::IPV4.to_byte(), Some(0x1));
    /// assert_eq!(AddressFamily::IPV6.to_byte(), Some(0x2));
    /// assert_eq!(AddressFamily::Unspecified.to_byte(), None);
    /// ```
    pub fn to_byte(self) -> Option<u8> {
        match self {
            AddressFamily::IPV4 => Some(0x1),
            AddressFamily::IPV6 => Some(0x2),
            _ => None,
        }
    }

    /// The number of address bytes for this family
    pub fn address_len(self) -> Option<usize> {
        match self {
            AddressFamily::IPV4 => Some(4),
            AddressFamily::IPV6 => Some(16),
            _ => None,
        }
    }
}

impl std::fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AddressFamily::IPV4 => write!(f, "IPV4"),
            AddressFamily::IPV6 => write!(f, "IPV6"),
            AddressFamily::Unspecified => write!(f, "Unspecified"),
            AddressFamily::Other(v) => write!(f, "Other({v})"),
        }
    }
}

/// A socket address that can be written into a STUN address attribute
pub trait SocketAddress {
    /// The family of the address
    fn family(&self) -> AddressFamily;
    /// The port in host byte order
    fn port(&self) -> u16;
    /// The address bytes in network byte order
    fn octets(&self) -> SmallVec<[u8; 16]>;
}

impl SocketAddress for SocketAddr {
    fn family(&self) -> AddressFamily {
        match self {
            SocketAddr::V4(_) => AddressFamily::IPV4,
            SocketAddr::V6(_) => AddressFamily::IPV6,
        }
    }

    fn port(&self) -> u16 {
        SocketAddr::port(self)
    }

    fn octets(&self) -> SmallVec<[u8; 16]> {
        match self.ip() {
            IpAddr::V4(ip) => SmallVec::from_slice(&ip.octets()),
            IpAddr::V6(ip) => SmallVec::from_slice(&ip.octets()),
        }
    }
}

impl<T: SocketAddress + ?Sized> SocketAddress for &T {
    fn family(&self) -> AddressFamily {
        (**self).family()
    }

    fn port(&self) -> u16 {
        (**self).port()
    }

    fn octets(&self) -> SmallVec<[u8; 16]> {
        (**self).octets()
    }
}

/// An IPv4 or IPv6 address and port that may also be unset.
///
/// Two [`Address`]es are equal when their families, addresses and ports are all equal.
///
/// # Examples
///
/// ```
/// # use stun_msg::address::{Address, AddressFamily, SocketAddress};
/// let mut addr = Address::new();
/// assert_eq!(addr.family(), AddressFamily::Unspecified);
/// addr.set_ipv4(0x7f000001);
/// addr.set_port(3478);
/// assert_eq!(addr.to_string(), "127.0.0.1:3478");
/// assert!(addr.is_private());
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    ip: Option<IpAddr>,
    port: u16,
}

impl Address {
    /// Construct an unset [`Address`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an IPv4 address from its host order integer value
    pub fn set_ipv4(&mut self, addr: u32) {
        self.ip = Some(IpAddr::V4(Ipv4Addr::from(addr)));
    }

    /// Set an IPv6 address from its network order bytes
    pub fn set_ipv6(&mut self, octets: [u8; 16]) {
        self.ip = Some(IpAddr::V6(Ipv6Addr::from(octets)));
    }

    /// Set the port
    pub fn set_port(&mut self, port: u16) {
        self.port = port;
    }

    /// The IP address, if any has been set
    pub fn ip(&self) -> Option<IpAddr> {
        self.ip
    }

    /// Convert into a [`SocketAddr`].  Returns `None` if no address has been set.
    pub fn to_socket_addr(&self) -> Option<SocketAddr> {
        self.ip.map(|ip| SocketAddr::new(ip, self.port))
    }

    /// Whether this address is within a private (non-routable) range.
    ///
    /// IPv4 addresses are private within 10.0.0.0/8, 172.16.0.0/12, 192.168.0.0/16 and the
    /// loopback range 127.0.0.0/8.  IPv6 addresses are private when they are loopback or
    /// within fc00::/7.
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_msg::address::Address;
    /// let private: Address = "172.20.1.1:0".parse().unwrap();
    /// assert!(private.is_private());
    /// let public: Address = "172.32.1.1:0".parse().unwrap();
    /// assert!(!public.is_private());
    /// ```
    pub fn is_private(&self) -> bool {
        match self.ip {
            Some(IpAddr::V4(ip)) => ip.is_private() || ip.is_loopback(),
            Some(IpAddr::V6(ip)) => ip.is_loopback() || (ip.segments()[0] & 0xfe00) == 0xfc00,
            None => false,
        }
    }
}

impl SocketAddress for Address {
    fn family(&self) -> AddressFamily {
        match self.ip {
            Some(IpAddr::V4(_)) => AddressFamily::IPV4,
            Some(IpAddr::V6(_)) => AddressFamily::IPV6,
            None => AddressFamily::Unspecified,
        }
    }

    fn port(&self) -> u16 {
        self.port
    }

    fn octets(&self) -> SmallVec<[u8; 16]> {
        match self.ip {
            Some(IpAddr::V4(ip)) => SmallVec::from_slice(&ip.octets()),
            Some(IpAddr::V6(ip)) => SmallVec::from_slice(&ip.octets()),
            None => SmallVec::new(),
        }
    }
}

impl From<SocketAddr> for Address {
    fn from(value: SocketAddr) -> Self {
        Self {
            ip: Some(value.ip()),
            port: value.port(),
        }
    }
}

/// Errors when parsing an [`Address`] from a string
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AddressParseError {
    /// The string is neither an IP address nor a socket address
    #[error("Invalid address: {}", .0)]
    Invalid(#[from] AddrParseError),
}

impl FromStr for Address {
    type Err = AddressParseError;

    /// Parse either a socket address (`"192.0.2.1:3478"`, `"[2001:db8::1]:3478"`) or a bare IP
    /// address which leaves the port at 0.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(addr) = SocketAddr::from_str(s) {
            return Ok(addr.into());
        }
        let ip = IpAddr::from_str(s)?;
        Ok(Self {
            ip: Some(ip),
            port: 0,
        })
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_socket_addr() {
            Some(addr) => write!(f, "{addr}"),
            None => write!(f, "(unset):{}", self.port),
        }
    }
}

/// A generic socket address as a raw family code, port and address bytes.
///
/// Allows writing addresses from any socket API, including ones in a family that STUN cannot
/// represent.
///
/// # Examples
///
/// ```
/// # use stun_msg::address::{AddressFamily, RawSocketAddr, SocketAddress};
/// let raw = RawSocketAddr::new(AddressFamily::IPV4, 3478, &[192, 0, 2, 1]);
/// assert_eq!(raw.family(), AddressFamily::IPV4);
/// assert_eq!(raw.port(), 3478);
/// assert_eq!(raw.octets().as_slice(), &[192, 0, 2, 1]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSocketAddr<'a> {
    family: AddressFamily,
    port: u16,
    addr: &'a [u8],
}

impl<'a> RawSocketAddr<'a> {
    /// Construct a new [`RawSocketAddr`]
    pub fn new(family: AddressFamily, port: u16, addr: &'a [u8]) -> Self {
        Self { family, port, addr }
    }

    /// The raw address bytes
    pub fn addr(&self) -> &'a [u8] {
        self.addr
    }
}

impl SocketAddress for RawSocketAddr<'_> {
    fn family(&self) -> AddressFamily {
        self.family
    }

    fn port(&self) -> u16 {
        self.port
    }

    fn octets(&self) -> SmallVec<[u8; 16]> {
        SmallVec::from_slice(self.addr)
    }
}

impl TryFrom<RawSocketAddr<'_>> for Address {
    type Error = StunWriteError;

    fn try_from(value: RawSocketAddr<'_>) -> Result<Self, Self::Error> {
        let expected = value
            .family
            .address_len()
            .ok_or(StunWriteError::InvalidAddressFamily(value.family))?;
        if value.addr.len() < expected {
            return Err(StunWriteError::InvalidAddressLength {
                expected,
                actual: value.addr.len(),
            });
        }
        let mut ret = Address::new();
        ret.set_port(value.port);
        if expected == 4 {
            let mut octets = [0; 4];
            octets.copy_from_slice(&value.addr[..4]);
            ret.set_ipv4(u32::from_be_bytes(octets));
        } else {
            let mut octets = [0; 16];
            octets.copy_from_slice(&value.addr[..16]);
            ret.set_ipv6(octets);
        }
        Ok(ret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_equality() {
        let _log = crate::tests::test_init_log();
        let a: Address = "192.168.1.2:1000".parse().unwrap();
        let mut b = Address::new();
        b.set_ipv4(0xc0a8_0102);
        assert_ne!(a, b);
        b.set_port(1000);
        assert_eq!(a, b);
        let c: Address = "[::ffff:192.168.1.2]:1000".parse().unwrap();
        assert_ne!(a, c);
        assert_eq!(Address::new(), Address::new());
    }

    #[test]
    fn address_parse_bare_ip() {
        let _log = crate::tests::test_init_log();
        let a: Address = "2001:db8::1".parse().unwrap();
        assert_eq!(a.family(), AddressFamily::IPV6);
        assert_eq!(a.port(), 0);
        assert!(matches!(
            "not an address".parse::<Address>(),
            Err(AddressParseError::Invalid(_))
        ));
    }

    #[test]
    fn address_private_ranges() {
        let _log = crate::tests::test_init_log();
        for private in [
            "10.0.0.1",
            "10.255.255.255",
            "172.16.0.1",
            "172.31.255.255",
            "192.168.0.1",
            "127.0.0.1",
            "::1",
            "fd00::1",
        ] {
            let addr: Address = private.parse().unwrap();
            assert!(addr.is_private(), "{private}");
        }
        for public in ["8.8.8.8", "172.15.0.1", "192.169.0.1", "11.0.0.1", "2001:db8::1"] {
            let addr: Address = public.parse().unwrap();
            assert!(!addr.is_private(), "{public}");
        }
        assert!(!Address::new().is_private());
    }

    #[test]
    fn address_display() {
        let _log = crate::tests::test_init_log();
        let mut a = Address::new();
        a.set_ipv6([0x20, 0x01, 0x0d, 0xb8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1]);
        a.set_port(5);
        assert_eq!(a.to_string(), "[2001:db8::1]:5");
        assert_eq!(a.octets().len(), 16);
        assert_eq!(Address::new().to_string(), "(unset):0");
    }

    #[test]
    fn raw_to_address() {
        let _log = crate::tests::test_init_log();
        let raw = RawSocketAddr::new(AddressFamily::IPV4, 80, &[10, 0, 0, 1]);
        let addr = Address::try_from(raw).unwrap();
        assert_eq!(addr.to_socket_addr(), Some("10.0.0.1:80".parse().unwrap()));

        let short = RawSocketAddr::new(AddressFamily::IPV6, 80, &[0; 4]);
        assert!(matches!(
            Address::try_from(short),
            Err(StunWriteError::InvalidAddressLength {
                expected: 16,
                actual: 4
            })
        ));

        let unix = RawSocketAddr::new(AddressFamily::Other(1), 0, &[]);
        assert!(matches!(
            Address::try_from(unix),
            Err(StunWriteError::InvalidAddressFamily(AddressFamily::Other(1)))
        ));
    }
}
