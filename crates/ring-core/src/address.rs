//! Address: where a peer can be reached, and who it is.
//!
//! The ring has no separate identifier scheme. A peer is identified by the
//! endpoint it listens on, so equality is structural over host and port.

use std::fmt::{self, Display, Formatter};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid address format: expected host:port, got {0:?}")]
    InvalidFormat(String),
    #[error("Invalid host {0:?}: expected an IPv4 address or localhost")]
    InvalidHost(String),
    #[error("Invalid port {0:?}")]
    InvalidPort(String),
    #[error("IPv6 addresses are not supported: {0}")]
    Ipv6(SocketAddr),
}

/// A peer's reachable endpoint (IPv4 host + port).
///
/// # Examples
/// ```
/// use ring_core::Address;
///
/// let addr: Address = "127.0.0.1:8001".parse().unwrap();
/// assert_eq!(addr.port(), 8001);
/// assert_eq!(addr, "localhost:8001".parse().unwrap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    host: Ipv4Addr,
    port: u16,
}

impl Address {
    /// Zero value used for fields a token kind does not carry.
    pub const UNSPECIFIED: Address = Address::new(Ipv4Addr::UNSPECIFIED, 0);

    pub const fn new(host: Ipv4Addr, port: u16) -> Self {
        Self { host, port }
    }

    /// Loopback address on the given port.
    pub const fn localhost(port: u16) -> Self {
        Self::new(Ipv4Addr::LOCALHOST, port)
    }

    pub fn host(&self) -> Ipv4Addr {
        self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_unspecified(&self) -> bool {
        *self == Self::UNSPECIFIED
    }

    /// Parse a bare host: dotted IPv4 or `localhost`.
    pub fn parse_host(host: &str) -> Result<Ipv4Addr, AddressError> {
        if host.eq_ignore_ascii_case("localhost") {
            return Ok(Ipv4Addr::LOCALHOST);
        }
        host.parse()
            .map_err(|_| AddressError::InvalidHost(host.to_string()))
    }

    /// Parse a bare port number.
    pub fn parse_port(port: &str) -> Result<u16, AddressError> {
        port.parse()
            .map_err(|_| AddressError::InvalidPort(port.to_string()))
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| AddressError::InvalidFormat(s.to_string()))?;
        if host.is_empty() || port.is_empty() {
            return Err(AddressError::InvalidFormat(s.to_string()));
        }
        Ok(Self::new(Self::parse_host(host)?, Self::parse_port(port)?))
    }
}

impl From<SocketAddrV4> for Address {
    fn from(addr: SocketAddrV4) -> Self {
        Self::new(*addr.ip(), addr.port())
    }
}

impl TryFrom<SocketAddr> for Address {
    type Error = AddressError;

    fn try_from(addr: SocketAddr) -> Result<Self, Self::Error> {
        match addr {
            SocketAddr::V4(v4) => Ok(v4.into()),
            SocketAddr::V6(_) => Err(AddressError::Ipv6(addr)),
        }
    }
}

impl From<Address> for SocketAddr {
    fn from(addr: Address) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(addr.host, addr.port))
    }
}

// Serialize as "host:port" so config banners and logs read naturally
impl serde::Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ipv4() {
        let addr: Address = "10.0.0.7:9000".parse().unwrap();
        assert_eq!(addr.host(), Ipv4Addr::new(10, 0, 0, 7));
        assert_eq!(addr.port(), 9000);
    }

    #[test]
    fn test_parse_localhost() {
        let addr: Address = "localhost:8001".parse().unwrap();
        assert_eq!(addr, Address::localhost(8001));

        let upper: Address = "LOCALHOST:8001".parse().unwrap();
        assert_eq!(upper, addr);
    }

    #[test]
    fn test_display() {
        assert_eq!(Address::localhost(8002).to_string(), "127.0.0.1:8002");
        assert_eq!(Address::UNSPECIFIED.to_string(), "0.0.0.0:0");
    }

    #[test]
    fn test_structural_equality() {
        let a: Address = "127.0.0.1:8001".parse().unwrap();
        assert_eq!(a, Address::localhost(8001));
        assert_ne!(a, Address::localhost(8002));
        assert_ne!(a, Address::new(Ipv4Addr::new(127, 0, 0, 2), 8001));
    }

    #[test]
    fn test_missing_separator() {
        assert_eq!(
            "127.0.0.1".parse::<Address>(),
            Err(AddressError::InvalidFormat("127.0.0.1".into()))
        );
        assert!(":8001".parse::<Address>().is_err());
        assert!("127.0.0.1:".parse::<Address>().is_err());
    }

    #[test]
    fn test_invalid_host() {
        assert_eq!(
            "example.com:80".parse::<Address>(),
            Err(AddressError::InvalidHost("example.com".into()))
        );
        assert!("256.0.0.1:80".parse::<Address>().is_err());
    }

    #[test]
    fn test_invalid_port() {
        assert_eq!(
            "127.0.0.1:70000".parse::<Address>(),
            Err(AddressError::InvalidPort("70000".into()))
        );
        assert!("127.0.0.1:http".parse::<Address>().is_err());
    }

    #[test]
    fn test_socket_addr_conversions() {
        let addr = Address::localhost(4000);
        let socket: SocketAddr = addr.into();
        assert_eq!(socket.to_string(), "127.0.0.1:4000");
        assert_eq!(Address::try_from(socket).unwrap(), addr);

        let v6: SocketAddr = "[::1]:4000".parse().unwrap();
        assert!(matches!(Address::try_from(v6), Err(AddressError::Ipv6(_))));
    }

    #[test]
    fn test_unspecified() {
        assert!(Address::UNSPECIFIED.is_unspecified());
        assert!(!Address::localhost(1).is_unspecified());
    }

    #[test]
    fn test_serde_as_string() {
        let addr = Address::localhost(8003);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"127.0.0.1:8003\"");
        let parsed: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, addr);
    }
}
