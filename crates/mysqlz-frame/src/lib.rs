//! Packet framing for the MySQL compressed protocol.
//!
//! Every frame on the wire is a 7-byte header followed by its payload:
//! - a 3-byte little-endian payload length
//! - a 1-byte sequence id, wrapping per direction
//! - a 3-byte little-endian uncompressed length, 0 when the payload is raw
//!
//! [`Framer`] sends and receives whole packets over any
//! [`Transport`](mysqlz_transport::Transport): it splits, compresses, checks
//! sequence ids and reassembles. With the `async` feature,
//! [`codec::CompressedCodec`] does the same for `tokio_util::codec::Framed`.

#[cfg(feature = "async")]
pub mod codec;
pub mod config;
pub mod context;
pub mod error;
pub mod framer;
pub mod header;
pub mod inspect;
mod reader;
pub mod sequence;
mod writer;

pub use config::{
    CompressionConfig, FramerConfig, CLIENT_COMPRESS, DEFAULT_MAX_FRAME_PAYLOAD,
    DEFAULT_MAX_PACKET_SIZE, DEFAULT_MIN_COMPRESS_LEN,
};
pub use context::CompressionContext;
pub use error::{ErrorKind, FrameError, Result};
pub use framer::Framer;
pub use header::{FrameHeader, HEADER_SIZE, MAX_PAYLOAD_LEN};
pub use inspect::{inspect_frames, FrameInfo, FrameIter};
pub use sequence::Sequence;
