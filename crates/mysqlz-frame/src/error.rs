use mysqlz_transport::TransportError;
use mysqlz_zlib::ZlibError;

/// Broad category of a [`FrameError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid compression level or framer settings.
    Configuration,
    /// The compressor failed on an outbound chunk.
    Compression,
    /// An inbound payload could not be decompressed to its declared length.
    Decompression,
    /// A frame arrived with an unexpected sequence id.
    Sequence,
    /// A frame or packet exceeds the configured size limits.
    Limit,
    /// Reading from or writing to the stream failed.
    Transport,
    /// The framer already failed and refuses further use.
    Poisoned,
}

/// Errors raised while framing, compressing, or reassembling packets.
///
/// Every variant is fatal to the connection. After the first error the framer
/// is poisoned and only returns [`FrameError::Poisoned`].
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The framer configuration is invalid.
    #[error("invalid framer configuration: {reason}")]
    Configuration { reason: String },

    /// Compressing the chunk sent as `sequence_id` failed.
    #[error("compressing frame {sequence_id} failed: {source}")]
    Compression {
        sequence_id: u8,
        #[source]
        source: ZlibError,
    },

    /// Decompressing frame `sequence_id` to `expected_len` bytes failed.
    #[error("decompressing frame {sequence_id} to {expected_len} bytes failed: {source}")]
    Decompression {
        sequence_id: u8,
        expected_len: usize,
        #[source]
        source: ZlibError,
    },

    /// The received sequence id does not match the expected one.
    #[error("packet sequence mismatch (expected {expected}, got {actual})")]
    Sequence { expected: u8, actual: u8 },

    /// A frame or packet exceeds a size limit.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The underlying stream failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// An earlier error left the connection state invalid.
    #[error("framer is unusable after an earlier error; discard the connection")]
    Poisoned,
}

impl FrameError {
    /// The category this error falls into.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FrameError::Configuration { .. } => ErrorKind::Configuration,
            FrameError::Compression { .. } => ErrorKind::Compression,
            FrameError::Decompression { .. } => ErrorKind::Decompression,
            FrameError::Sequence { .. } => ErrorKind::Sequence,
            FrameError::PayloadTooLarge { .. } => ErrorKind::Limit,
            FrameError::Transport(_) => ErrorKind::Transport,
            FrameError::Poisoned => ErrorKind::Poisoned,
        }
    }

    /// Whether the error comes from a read or write timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, FrameError::Transport(err) if err.is_timeout())
    }

    pub(crate) fn configuration(reason: impl Into<String>) -> Self {
        FrameError::Configuration {
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for FrameError {
    fn from(err: std::io::Error) -> Self {
        FrameError::Transport(TransportError::Io(err))
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_variants() {
        assert_eq!(
            FrameError::Sequence {
                expected: 1,
                actual: 3
            }
            .kind(),
            ErrorKind::Sequence
        );
        assert_eq!(FrameError::Poisoned.kind(), ErrorKind::Poisoned);
        assert_eq!(
            FrameError::configuration("bad").kind(),
            ErrorKind::Configuration
        );
        let io = FrameError::from(std::io::Error::from(std::io::ErrorKind::BrokenPipe));
        assert_eq!(io.kind(), ErrorKind::Transport);
    }

    #[test]
    fn timeout_is_detected_through_transport() {
        let err = FrameError::from(std::io::Error::from(std::io::ErrorKind::WouldBlock));
        assert!(err.is_timeout());
        assert!(!FrameError::Poisoned.is_timeout());
    }

    #[test]
    fn sequence_message_names_both_ids() {
        let err = FrameError::Sequence {
            expected: 4,
            actual: 9,
        };
        assert_eq!(
            err.to_string(),
            "packet sequence mismatch (expected 4, got 9)"
        );
    }
}
