use std::fmt;
use std::io;

use mysqlz_frame::FrameError;
use mysqlz_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused | io::ErrorKind::NotFound => FAILURE,
        io::ErrorKind::ConnectionReset | io::ErrorKind::BrokenPipe => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Bind { source, .. }
        | TransportError::Connect { source, .. }
        | TransportError::Accept(source)
        | TransportError::Io(source) => io_error(context, source),
        TransportError::UnexpectedEof { .. } | TransportError::WriteZero { .. } => {
            CliError::new(TRANSPORT_ERROR, format!("{context}: {err}"))
        }
        TransportError::InvalidEndpoint { .. } | TransportError::PathTooLong { .. } => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Transport(err) => transport_error(context, err),
        FrameError::Configuration { .. } => CliError::new(USAGE, format!("{context}: {err}")),
        FrameError::Sequence { .. }
        | FrameError::Decompression { .. }
        | FrameError::PayloadTooLarge { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        FrameError::Compression { .. } | FrameError::Poisoned => {
            CliError::new(INTERNAL, format!("{context}: {err}"))
        }
    }
}

/// Truncated capture files are bad input, not a dropped connection.
pub fn capture_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Transport(TransportError::UnexpectedEof { .. }) => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        other => frame_error(context, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_errors_map_to_exit_codes() {
        let seq = FrameError::Sequence {
            expected: 0,
            actual: 2,
        };
        assert_eq!(frame_error("read", seq).code, DATA_INVALID);

        let timeout = FrameError::from(io::Error::from(io::ErrorKind::WouldBlock));
        assert_eq!(frame_error("read", timeout).code, TIMEOUT);

        let eof = FrameError::Transport(TransportError::UnexpectedEof {
            expected: 7,
            received: 0,
        });
        assert_eq!(frame_error("read", eof).code, TRANSPORT_ERROR);

        assert_eq!(frame_error("read", FrameError::Poisoned).code, INTERNAL);
    }

    #[test]
    fn truncated_capture_is_data_invalid() {
        let eof = FrameError::Transport(TransportError::UnexpectedEof {
            expected: 16,
            received: 3,
        });
        let err = capture_error("unpack", eof);
        assert_eq!(err.code, DATA_INVALID);
        assert!(err.message.starts_with("unpack: "));
    }

    #[test]
    fn bad_endpoint_is_usage() {
        let err = TransportError::InvalidEndpoint {
            input: "::1".to_string(),
            reason: "ipv6 hosts must be bracketed",
        };
        assert_eq!(transport_error("connect", err).code, USAGE);
    }
}
