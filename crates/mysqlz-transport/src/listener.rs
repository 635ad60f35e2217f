use std::net::TcpListener;
#[cfg(unix)]
use std::os::unix::fs::{FileTypeExt, MetadataExt, PermissionsExt};
#[cfg(unix)]
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::endpoint::Endpoint;
use crate::error::{Result, TransportError};
use crate::stream::WireStream;

/// Accepts incoming connections on a TCP address or a Unix socket path.
///
/// Used by servers and test peers that speak the compressed protocol back to
/// a client. Unix socket files created by `bind` are removed again on drop.
pub struct WireListener {
    inner: ListenerInner,
}

enum ListenerInner {
    Tcp(TcpListener),
    #[cfg(unix)]
    Unix(UnixSocketFile),
}

impl WireListener {
    /// Default permission mode for created socket files.
    pub const DEFAULT_SOCKET_MODE: u32 = 0o600;

    /// Bind to the endpoint.
    pub fn bind(endpoint: &Endpoint) -> Result<Self> {
        match endpoint {
            Endpoint::Tcp(addr) => {
                let listener = TcpListener::bind(addr.as_str()).map_err(|e| TransportError::Bind {
                    endpoint: endpoint.to_string(),
                    source: e,
                })?;
                info!(%endpoint, "listening on tcp");
                Ok(Self {
                    inner: ListenerInner::Tcp(listener),
                })
            }
            #[cfg(unix)]
            Endpoint::Unix(path) => Ok(Self {
                inner: ListenerInner::Unix(UnixSocketFile::bind(path, Self::DEFAULT_SOCKET_MODE)?),
            }),
            #[cfg(not(unix))]
            Endpoint::Unix(_) => Err(TransportError::Bind {
                endpoint: endpoint.to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::Unsupported,
                    "unix sockets are not available on this platform",
                ),
            }),
        }
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<WireStream> {
        let stream = match &self.inner {
            ListenerInner::Tcp(listener) => {
                let (stream, addr) = listener.accept().map_err(TransportError::Accept)?;
                debug!(%addr, "accepted tcp connection");
                stream.set_nodelay(true)?;
                WireStream::from(stream)
            }
            #[cfg(unix)]
            ListenerInner::Unix(socket) => {
                let (stream, _addr) = socket.listener.accept().map_err(TransportError::Accept)?;
                debug!(path = ?socket.path, "accepted unix connection");
                WireStream::from(stream)
            }
        };
        Ok(stream)
    }

    /// The endpoint actually bound, with any ephemeral TCP port resolved.
    pub fn local_endpoint(&self) -> Result<Endpoint> {
        match &self.inner {
            ListenerInner::Tcp(listener) => Ok(Endpoint::Tcp(listener.local_addr()?.to_string())),
            #[cfg(unix)]
            ListenerInner::Unix(socket) => Ok(Endpoint::Unix(socket.path.clone())),
        }
    }
}

/// A bound Unix socket file, remembered by inode so drop only removes the
/// file this listener created.
#[cfg(unix)]
struct UnixSocketFile {
    listener: std::os::unix::net::UnixListener,
    path: PathBuf,
    created_inode: (u64, u64),
}

#[cfg(unix)]
impl UnixSocketFile {
    fn bind(path: &Path, mode: u32) -> Result<Self> {
        crate::endpoint::check_socket_path(path)?;
        let bind_err = |source: std::io::Error| TransportError::Bind {
            endpoint: format!("unix:{}", path.display()),
            source,
        };

        // A leftover socket from a crashed server is replaced; any other file is not.
        if let Ok(metadata) = std::fs::symlink_metadata(path) {
            if !metadata.file_type().is_socket() {
                return Err(bind_err(std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    "existing path is not a unix socket",
                )));
            }
            debug!(?path, "removing stale socket");
            std::fs::remove_file(path).map_err(bind_err)?;
        }

        let listener = std::os::unix::net::UnixListener::bind(path).map_err(bind_err)?;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).map_err(bind_err)?;
        let metadata = std::fs::symlink_metadata(path).map_err(bind_err)?;

        info!(?path, "listening on unix socket");
        Ok(Self {
            listener,
            path: path.to_path_buf(),
            created_inode: (metadata.dev(), metadata.ino()),
        })
    }
}

#[cfg(unix)]
impl Drop for UnixSocketFile {
    fn drop(&mut self) {
        let Ok(metadata) = std::fs::symlink_metadata(&self.path) else {
            return;
        };
        if metadata.file_type().is_socket() && (metadata.dev(), metadata.ino()) == self.created_inode
        {
            debug!(path = ?self.path, "cleaning up socket file");
            let _ = std::fs::remove_file(&self.path);
        } else {
            debug!(path = ?self.path, "socket path replaced; skipping cleanup");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};

    use super::*;

    #[test]
    fn tcp_bind_accept_connect() {
        let listener = WireListener::bind(&"127.0.0.1:0".parse().unwrap()).unwrap();
        let endpoint = listener.local_endpoint().unwrap();

        let client = std::thread::spawn(move || {
            let mut stream = endpoint.connect(None).unwrap();
            stream.write_all(b"hello").unwrap();
        });

        let mut server = listener.accept().unwrap();
        let mut buf = [0u8; 5];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");
        assert_eq!(server.transport_name(), "tcp");

        client.join().unwrap();
    }

    #[cfg(unix)]
    fn temp_socket_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("mysqlz-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    #[cfg(unix)]
    fn unix_bind_accept_connect_and_cleanup() {
        let dir = temp_socket_dir("listener");
        let sock_path = dir.join("mysqld.sock");
        let endpoint = Endpoint::Unix(sock_path.clone());

        let listener = WireListener::bind(&endpoint).unwrap();
        let mode = std::fs::metadata(&sock_path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, WireListener::DEFAULT_SOCKET_MODE);

        let client = std::thread::spawn(move || {
            let mut stream = endpoint.connect(None).unwrap();
            stream.write_all(b"hi").unwrap();
        });
        let mut server = listener.accept().unwrap();
        let mut buf = [0u8; 2];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hi");
        client.join().unwrap();

        drop(listener);
        assert!(!sock_path.exists(), "socket file should be removed on drop");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    #[cfg(unix)]
    fn unix_bind_refuses_regular_file() {
        let dir = temp_socket_dir("regular-file");
        let sock_path = dir.join("not-a-socket.sock");
        std::fs::write(&sock_path, b"data").unwrap();

        let result = WireListener::bind(&Endpoint::Unix(sock_path.clone()));
        assert!(matches!(result, Err(TransportError::Bind { .. })));
        assert!(sock_path.exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    #[cfg(unix)]
    fn unix_drop_keeps_replaced_path() {
        let dir = temp_socket_dir("replaced");
        let sock_path = dir.join("drop.sock");

        let listener = WireListener::bind(&Endpoint::Unix(sock_path.clone())).unwrap();
        std::fs::remove_file(&sock_path).unwrap();
        std::fs::write(&sock_path, b"replacement").unwrap();

        drop(listener);
        assert!(sock_path.exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
