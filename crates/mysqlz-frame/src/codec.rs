//! Async framing via `tokio_util::codec`.

use bytes::{Buf, Bytes, BytesMut};
use mysqlz_transport::TransportError;
use tokio_util::codec::{Decoder, Encoder};

use crate::config::FramerConfig;
use crate::context::CompressionContext;
use crate::error::{FrameError, Result};
use crate::header::{FrameHeader, HEADER_SIZE};

/// Compressed-protocol codec for `tokio_util::codec::Framed`.
///
/// Applies the same header, sequencing, compression and reassembly rules as
/// the blocking [`Framer`](crate::Framer). Items are whole packets.
#[derive(Debug)]
pub struct CompressedCodec {
    context: CompressionContext,
    partial: BytesMut,
}

impl CompressedCodec {
    pub fn new(config: FramerConfig) -> Result<Self> {
        Ok(Self {
            context: CompressionContext::new(config)?,
            partial: BytesMut::new(),
        })
    }

    /// The per-connection state.
    pub fn context(&self) -> &CompressionContext {
        &self.context
    }

    /// Restart both sequence counters at 0.
    pub fn reset_sequences(&mut self) {
        self.context.reset_sequences();
    }

    fn decode_frames(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>> {
        loop {
            let Some(header) = FrameHeader::peek(src) else {
                return Ok(None);
            };
            self.context.check_header(&header, self.partial.len())?;

            let frame_len = header.wire_size();
            if src.len() < frame_len {
                src.reserve(frame_len - src.len());
                return Ok(None);
            }

            src.advance(HEADER_SIZE);
            let payload = src.split_to(header.compressed_len);
            self.context.accept_header();
            self.context
                .decode_payload(&header, &payload, &mut self.partial)?;

            if self.context.is_final_chunk(header.payload_len()) {
                return Ok(Some(self.partial.split().freeze()));
            }
        }
    }
}

impl Decoder for CompressedCodec {
    type Item = Bytes;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>> {
        self.context.ensure_usable()?;
        let result = self.decode_frames(src);
        if result.is_err() {
            self.context.poison();
        }
        result
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>> {
        if let Some(packet) = self.decode(src)? {
            return Ok(Some(packet));
        }
        if src.is_empty() && self.partial.is_empty() {
            return Ok(None);
        }

        self.context.poison();
        let expected = FrameHeader::peek(src).map_or(HEADER_SIZE, |h| h.wire_size());
        Err(FrameError::Transport(TransportError::UnexpectedEof {
            expected,
            received: src.len(),
        }))
    }
}

impl Encoder<Bytes> for CompressedCodec {
    type Error = FrameError;

    fn encode(&mut self, packet: Bytes, dst: &mut BytesMut) -> Result<()> {
        self.context.ensure_usable()?;
        let result = self.context.encode_packet(&packet, dst);
        if result.is_err() {
            self.context.poison();
        }
        result
    }
}
