use bytes::{Buf, BufMut};
use serde::Serialize;

use crate::error::{FrameError, Result};

/// Compressed frame header: compressed length (3) + sequence (1) + uncompressed length (3).
pub const HEADER_SIZE: usize = 7;

/// Largest length a 3-byte header field can carry.
pub const MAX_PAYLOAD_LEN: usize = 0xFF_FF_FF;

/// The header in front of every compressed-protocol frame.
///
/// Wire format:
/// ```text
/// ┌──────────────────┬──────────┬────────────────────┬─────────────────────────┐
/// │ compressed len   │ sequence │ uncompressed len   │ payload                 │
/// │ (3B LE)          │ (1B)     │ (3B LE, 0 = raw)   │ (compressed len bytes)  │
/// └──────────────────┴──────────┴────────────────────┴─────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FrameHeader {
    /// Bytes of payload on the wire.
    pub compressed_len: usize,
    /// Wrapping per-direction frame counter.
    pub sequence_id: u8,
    /// Size after decompression, or 0 when the payload is sent verbatim.
    pub uncompressed_len: usize,
}

impl FrameHeader {
    /// Header for a chunk sent without compression.
    pub fn passthrough(sequence_id: u8, len: usize) -> Self {
        Self {
            compressed_len: len,
            sequence_id,
            uncompressed_len: 0,
        }
    }

    /// Whether the payload is a zlib stream.
    pub fn is_compressed(&self) -> bool {
        self.uncompressed_len != 0
    }

    /// Length of the chunk this frame carries once decompressed.
    pub fn payload_len(&self) -> usize {
        if self.is_compressed() {
            self.uncompressed_len
        } else {
            self.compressed_len
        }
    }

    /// Header plus payload bytes on the wire.
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.compressed_len
    }

    /// Serialize the header.
    ///
    /// Fails with [`FrameError::PayloadTooLarge`] when a length does not fit
    /// in three bytes.
    pub fn encode(&self) -> Result<[u8; HEADER_SIZE]> {
        for len in [self.compressed_len, self.uncompressed_len] {
            if len > MAX_PAYLOAD_LEN {
                return Err(FrameError::PayloadTooLarge {
                    size: len,
                    max: MAX_PAYLOAD_LEN,
                });
            }
        }

        let mut out = [0u8; HEADER_SIZE];
        let mut buf = &mut out[..];
        buf.put_uint_le(self.compressed_len as u64, 3);
        buf.put_u8(self.sequence_id);
        buf.put_uint_le(self.uncompressed_len as u64, 3);
        Ok(out)
    }

    /// Parse a complete header.
    pub fn decode(bytes: [u8; HEADER_SIZE]) -> Self {
        let mut buf = &bytes[..];
        let compressed_len = buf.get_uint_le(3) as usize;
        let sequence_id = buf.get_u8();
        let uncompressed_len = buf.get_uint_le(3) as usize;
        Self {
            compressed_len,
            sequence_id,
            uncompressed_len,
        }
    }

    /// Parse the header at the start of `src`, or `None` if fewer than
    /// [`HEADER_SIZE`] bytes are available.
    pub fn peek(src: &[u8]) -> Option<Self> {
        let bytes: [u8; HEADER_SIZE] = src.get(..HEADER_SIZE)?.try_into().ok()?;
        Some(Self::decode(bytes))
    }
}
