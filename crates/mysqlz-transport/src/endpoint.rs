use std::fmt;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::stream::WireStream;

/// Default MySQL server port.
pub const DEFAULT_PORT: u16 = 3306;

/// Maximum socket path length.
/// Unix `sockaddr_un.sun_path` is typically 108 bytes on Linux, 104 on macOS.
#[cfg(target_os = "linux")]
pub(crate) const MAX_SOCKET_PATH_LEN: usize = 108;
#[cfg(not(target_os = "linux"))]
pub(crate) const MAX_SOCKET_PATH_LEN: usize = 104;

/// Where a MySQL server (or a test peer) can be reached.
///
/// Accepted spellings:
/// - `tcp://host:port`, `host:port`, or a bare `host` (port 3306)
/// - `unix:/path/to/mysqld.sock`, `unix:///path`, or an absolute path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// A `host:port` pair resolved at connect time.
    Tcp(String),
    /// A filesystem Unix domain socket.
    Unix(PathBuf),
}

impl Endpoint {
    /// Connect to the endpoint, bounding the TCP connect by `timeout`.
    pub fn connect(&self, timeout: Option<Duration>) -> Result<WireStream> {
        match self {
            Endpoint::Tcp(addr) => connect_tcp(addr, timeout),
            Endpoint::Unix(path) => connect_unix(path),
        }
    }
}

impl FromStr for Endpoint {
    type Err = TransportError;

    fn from_str(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(invalid(input, "endpoint must not be empty"));
        }

        if let Some(rest) = trimmed.strip_prefix("unix:") {
            let path = rest.strip_prefix("//").unwrap_or(rest);
            if path.is_empty() {
                return Err(invalid(input, "unix endpoint needs a socket path"));
            }
            return Ok(Endpoint::Unix(PathBuf::from(path)));
        }
        if trimmed.starts_with('/') {
            return Ok(Endpoint::Unix(PathBuf::from(trimmed)));
        }

        let addr = trimmed.strip_prefix("tcp://").unwrap_or(trimmed);
        if addr.is_empty() || addr.starts_with(':') {
            return Err(invalid(input, "tcp endpoint needs a host"));
        }
        match addr.rsplit_once(':') {
            // IPv6 literals are only accepted bracketed, e.g. [::1]:3306.
            Some((host, port)) if !host.contains(':') || host.ends_with(']') => {
                port.parse::<u16>()
                    .map_err(|_| invalid(input, "port must be a number in 0..=65535"))?;
                Ok(Endpoint::Tcp(addr.to_string()))
            }
            Some(_) => Err(invalid(input, "ipv6 hosts must be bracketed")),
            None => Ok(Endpoint::Tcp(format!("{addr}:{DEFAULT_PORT}"))),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Tcp(addr) => write!(f, "tcp://{addr}"),
            Endpoint::Unix(path) => write!(f, "unix:{}", path.display()),
        }
    }
}

fn invalid(input: &str, reason: &'static str) -> TransportError {
    TransportError::InvalidEndpoint {
        input: input.to_string(),
        reason,
    }
}

fn connect_tcp(addr: &str, timeout: Option<Duration>) -> Result<WireStream> {
    let connect_err = |source: std::io::Error| TransportError::Connect {
        endpoint: format!("tcp://{addr}"),
        source,
    };

    let candidates = addr.to_socket_addrs().map_err(connect_err)?;
    let mut last_err = None;
    for candidate in candidates {
        let attempt = match timeout {
            Some(limit) => TcpStream::connect_timeout(&candidate, limit),
            None => TcpStream::connect(candidate),
        };
        match attempt {
            Ok(stream) => {
                debug!(%candidate, "connected over tcp");
                let stream = WireStream::from(stream);
                stream.set_nodelay(true)?;
                return Ok(stream);
            }
            Err(err) => last_err = Some(err),
        }
    }

    Err(connect_err(last_err.unwrap_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::AddrNotAvailable,
            "address resolved to no candidates",
        )
    })))
}

#[cfg(unix)]
fn connect_unix(path: &std::path::Path) -> Result<WireStream> {
    check_socket_path(path)?;
    let stream =
        std::os::unix::net::UnixStream::connect(path).map_err(|e| TransportError::Connect {
            endpoint: format!("unix:{}", path.display()),
            source: e,
        })?;
    debug!(?path, "connected over unix socket");
    Ok(WireStream::from(stream))
}

#[cfg(not(unix))]
fn connect_unix(path: &std::path::Path) -> Result<WireStream> {
    Err(TransportError::Connect {
        endpoint: format!("unix:{}", path.display()),
        source: std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "unix sockets are not available on this platform",
        ),
    })
}

pub(crate) fn check_socket_path(path: &std::path::Path) -> Result<()> {
    let len = path.as_os_str().len();
    if len >= MAX_SOCKET_PATH_LEN {
        return Err(TransportError::PathTooLong {
            path: path.to_path_buf(),
            len,
            max: MAX_SOCKET_PATH_LEN,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tcp_forms() {
        assert_eq!(
            "db.internal:3307".parse::<Endpoint>().unwrap(),
            Endpoint::Tcp("db.internal:3307".to_string())
        );
        assert_eq!(
            "tcp://127.0.0.1:13306".parse::<Endpoint>().unwrap(),
            Endpoint::Tcp("127.0.0.1:13306".to_string())
        );
        assert_eq!(
            "localhost".parse::<Endpoint>().unwrap(),
            Endpoint::Tcp("localhost:3306".to_string())
        );
        assert_eq!(
            "[::1]:3306".parse::<Endpoint>().unwrap(),
            Endpoint::Tcp("[::1]:3306".to_string())
        );
    }

    #[test]
    fn parses_unix_forms() {
        let expected = Endpoint::Unix(PathBuf::from("/var/run/mysqld/mysqld.sock"));
        assert_eq!(
            "unix:/var/run/mysqld/mysqld.sock".parse::<Endpoint>().unwrap(),
            expected
        );
        assert_eq!(
            "unix:///var/run/mysqld/mysqld.sock"
                .parse::<Endpoint>()
                .unwrap(),
            expected
        );
        assert_eq!(
            "/var/run/mysqld/mysqld.sock".parse::<Endpoint>().unwrap(),
            expected
        );
    }

    #[test]
    fn rejects_malformed_endpoints() {
        for bad in ["", "   ", "unix:", "tcp://", ":3306", "host:notaport", "::1:3306"] {
            let err = bad.parse::<Endpoint>().unwrap_err();
            assert!(
                matches!(err, TransportError::InvalidEndpoint { .. }),
                "{bad:?} should be rejected, got {err}"
            );
        }
    }

    #[test]
    fn display_roundtrips_through_parse() {
        for input in ["tcp://localhost:3306", "unix:/tmp/mysql.sock"] {
            let endpoint: Endpoint = input.parse().unwrap();
            assert_eq!(endpoint.to_string(), input);
            assert_eq!(endpoint.to_string().parse::<Endpoint>().unwrap(), endpoint);
        }
    }

    #[test]
    fn connect_refused_reports_endpoint() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let endpoint = Endpoint::Tcp(addr.to_string());
        let err = endpoint
            .connect(Some(Duration::from_millis(200)))
            .unwrap_err();
        assert!(matches!(err, TransportError::Connect { .. }));
    }

    #[test]
    #[cfg(unix)]
    fn unix_path_too_long() {
        let long_path = "/tmp/".to_string() + &"a".repeat(200) + ".sock";
        let endpoint = Endpoint::Unix(PathBuf::from(long_path));
        let err = endpoint.connect(None).unwrap_err();
        assert!(matches!(err, TransportError::PathTooLong { .. }));
    }
}
