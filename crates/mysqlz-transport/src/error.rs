use std::path::PathBuf;

/// Errors that can occur on the byte-stream transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to connect to the endpoint.
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        source: std::io::Error,
    },

    /// Failed to bind a listener to the endpoint.
    #[error("failed to bind to {endpoint}: {source}")]
    Bind {
        endpoint: String,
        source: std::io::Error,
    },

    /// Failed to accept an incoming connection.
    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),

    /// An I/O error occurred on the stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the stream before the requested bytes arrived.
    #[error("stream closed after {received} of {expected} bytes")]
    UnexpectedEof { expected: usize, received: usize },

    /// The stream accepted zero bytes while data remained to be written.
    #[error("stream closed while writing ({written} of {total} bytes written)")]
    WriteZero { written: usize, total: usize },

    /// The socket path is too long for the platform.
    #[error("socket path too long ({len} bytes, max {max}): {path}")]
    PathTooLong {
        path: PathBuf,
        len: usize,
        max: usize,
    },

    /// The endpoint string could not be parsed.
    #[error("invalid endpoint {input:?}: {reason}")]
    InvalidEndpoint { input: String, reason: &'static str },
}

impl TransportError {
    /// Returns true when the error reports a timed-out or cancelled operation.
    pub fn is_timeout(&self) -> bool {
        match self {
            TransportError::Io(err) | TransportError::Accept(err) => matches!(
                err.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            ),
            TransportError::Connect { source, .. } => {
                source.kind() == std::io::ErrorKind::TimedOut
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
