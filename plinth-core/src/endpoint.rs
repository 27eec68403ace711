//! Endpoint addresses.
//!
//! Sockets bind and connect to `scheme://address` strings. The scheme picks
//! the transport registered with the owning context; only the address syntax
//! is checked here.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

/// Transport endpoint address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `tcp://host:port`
    Tcp(SocketAddr),
    /// `ipc:///path/to/socket`
    Ipc(PathBuf),
    /// `inproc://name`
    Inproc(String),
}

impl Endpoint {
    /// Parse an endpoint from a string.
    ///
    /// ```
    /// use plinth_core::endpoint::Endpoint;
    ///
    /// let ep = Endpoint::parse("inproc://nonblocking_test").unwrap();
    /// assert_eq!(ep.scheme(), "inproc");
    /// ```
    pub fn parse(s: &str) -> Result<Self, EndpointError> {
        s.parse()
    }

    /// Transport scheme without the `://` separator.
    pub fn scheme(&self) -> &'static str {
        match self {
            Endpoint::Tcp(_) => "tcp",
            Endpoint::Ipc(_) => "ipc",
            Endpoint::Inproc(_) => "inproc",
        }
    }

    /// Returns true if this is an inproc endpoint.
    pub fn is_inproc(&self) -> bool {
        matches!(self, Endpoint::Inproc(_))
    }
}

impl FromStr for Endpoint {
    type Err = EndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scheme, address) = s
            .split_once("://")
            .ok_or_else(|| EndpointError::InvalidScheme(s.to_string()))?;

        match scheme {
            "tcp" => address
                .parse::<SocketAddr>()
                .map(Endpoint::Tcp)
                .map_err(|_| EndpointError::InvalidTcpAddress(address.to_string())),
            "ipc" if address.is_empty() => Err(EndpointError::EmptyAddress(s.to_string())),
            "ipc" => Ok(Endpoint::Ipc(PathBuf::from(address))),
            "inproc" if address.is_empty() => Err(EndpointError::EmptyAddress(s.to_string())),
            "inproc" => Ok(Endpoint::Inproc(address.to_string())),
            _ => Err(EndpointError::InvalidScheme(s.to_string())),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Tcp(addr) => write!(f, "tcp://{addr}"),
            Endpoint::Ipc(path) => write!(f, "ipc://{}", path.display()),
            Endpoint::Inproc(name) => write!(f, "inproc://{name}"),
        }
    }
}

/// Errors that can occur when parsing endpoints.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("Invalid scheme in endpoint: {0} (expected tcp://, ipc://, or inproc://)")]
    InvalidScheme(String),

    #[error("Invalid TCP address: {0}")]
    InvalidTcpAddress(String),

    #[error("Endpoint has an empty address: {0}")]
    EmptyAddress(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tcp() {
        let endpoint = Endpoint::parse("tcp://127.0.0.1:5555").unwrap();
        assert_eq!(endpoint.scheme(), "tcp");
        assert_eq!(endpoint.to_string(), "tcp://127.0.0.1:5555");
    }

    #[test]
    fn test_parse_ipc() {
        let endpoint = Endpoint::parse("ipc:///tmp/test.sock").unwrap();
        assert!(matches!(endpoint, Endpoint::Ipc(_)));
        assert_eq!(endpoint.to_string(), "ipc:///tmp/test.sock");
    }

    #[test]
    fn test_parse_inproc() {
        let endpoint = Endpoint::parse("inproc://my-endpoint").unwrap();
        assert!(endpoint.is_inproc());
        assert_eq!(endpoint.to_string(), "inproc://my-endpoint");
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(
            Endpoint::parse("http://127.0.0.1:5555"),
            Err(EndpointError::InvalidScheme(_))
        ));
        assert!(matches!(
            Endpoint::parse("no-scheme"),
            Err(EndpointError::InvalidScheme(_))
        ));
        assert!(matches!(
            Endpoint::parse("tcp://invalid:port"),
            Err(EndpointError::InvalidTcpAddress(_))
        ));
        assert!(matches!(
            Endpoint::parse("inproc://"),
            Err(EndpointError::EmptyAddress(_))
        ));
    }
}
