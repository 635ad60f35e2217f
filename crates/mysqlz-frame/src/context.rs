use bytes::BytesMut;
use mysqlz_zlib::{compress_bound, ZlibEngine};
use tracing::trace;

use crate::config::FramerConfig;
use crate::error::{FrameError, Result};
use crate::header::{FrameHeader, HEADER_SIZE};
use crate::sequence::Sequence;

/// Per-connection compression state shared by the blocking [`Framer`](crate::Framer)
/// and the async [`CompressedCodec`](crate::codec::CompressedCodec).
///
/// Holds the negotiated settings, the zlib engine, both sequence counters and
/// the poisoned flag. It never touches a stream.
#[derive(Debug)]
pub struct CompressionContext {
    config: FramerConfig,
    engine: ZlibEngine,
    send_seq: Sequence,
    recv_seq: Sequence,
    poisoned: bool,
}

impl CompressionContext {
    /// Validate `config` and build the context.
    pub fn new(config: FramerConfig) -> Result<Self> {
        config.validate()?;
        let level = config.compression.level()?;
        Ok(Self {
            config,
            engine: ZlibEngine::new(level),
            send_seq: Sequence::default(),
            recv_seq: Sequence::default(),
            poisoned: false,
        })
    }

    pub fn config(&self) -> &FramerConfig {
        &self.config
    }

    /// Whether outbound chunks may be compressed.
    pub fn compression_enabled(&self) -> bool {
        self.config.compression.enabled
    }

    /// Sequence id the next outbound frame will carry.
    pub fn send_sequence(&self) -> u8 {
        self.send_seq.current()
    }

    /// Sequence id expected on the next inbound frame.
    pub fn recv_sequence(&self) -> u8 {
        self.recv_seq.current()
    }

    /// Restart both counters at 0.
    pub fn reset_sequences(&mut self) {
        self.send_seq.reset();
        self.recv_seq.reset();
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    pub(crate) fn poison(&mut self) {
        self.poisoned = true;
    }

    pub(crate) fn ensure_usable(&self) -> Result<()> {
        if self.poisoned {
            return Err(FrameError::Poisoned);
        }
        Ok(())
    }

    /// Append every frame of `packet` to `dst`.
    ///
    /// On error `dst` is left as it was and the caller must poison.
    pub(crate) fn encode_packet(&mut self, packet: &[u8], dst: &mut BytesMut) -> Result<()> {
        if packet.len() > self.config.max_packet_size {
            return Err(FrameError::PayloadTooLarge {
                size: packet.len(),
                max: self.config.max_packet_size,
            });
        }

        let start = dst.len();
        for chunk in Chunks::new(packet, self.config.max_frame_payload) {
            if let Err(err) = self.encode_chunk(chunk, dst) {
                dst.truncate(start);
                return Err(err);
            }
        }
        Ok(())
    }

    fn encode_chunk(&mut self, chunk: &[u8], dst: &mut BytesMut) -> Result<()> {
        let sequence_id = self.send_seq.current();
        let start = dst.len();
        let body = start + HEADER_SIZE;

        let mut header = FrameHeader::passthrough(sequence_id, chunk.len());
        if self.compression_enabled() && chunk.len() >= self.config.min_compress_len {
            dst.resize(body + compress_bound(chunk.len()), 0);
            let written = self
                .engine
                .compress(&mut dst[body..], chunk)
                .map_err(|source| FrameError::Compression {
                    sequence_id,
                    source,
                })?;
            if written < chunk.len() {
                dst.truncate(body + written);
                header = FrameHeader {
                    compressed_len: written,
                    sequence_id,
                    uncompressed_len: chunk.len(),
                };
            }
        }
        if !header.is_compressed() {
            dst.truncate(start);
            dst.resize(body, 0);
            dst.extend_from_slice(chunk);
        }

        dst[start..body].copy_from_slice(&header.encode()?);
        self.send_seq.advance();
        trace!(
            sequence_id,
            compressed_len = header.compressed_len,
            uncompressed_len = header.uncompressed_len,
            "encoded frame"
        );
        Ok(())
    }

    /// Check an inbound header against the expected sequence id and the size
    /// limits, given `assembled` bytes of the packet already received.
    pub(crate) fn check_header(&self, header: &FrameHeader, assembled: usize) -> Result<()> {
        self.recv_seq.check(header.sequence_id)?;

        let chunk = header.payload_len();
        if chunk > self.config.max_frame_payload {
            return Err(FrameError::PayloadTooLarge {
                size: chunk,
                max: self.config.max_frame_payload,
            });
        }
        let total = assembled.saturating_add(chunk);
        if total > self.config.max_packet_size {
            return Err(FrameError::PayloadTooLarge {
                size: total,
                max: self.config.max_packet_size,
            });
        }
        Ok(())
    }

    /// Consume the sequence id of a checked header.
    pub(crate) fn accept_header(&mut self) {
        self.recv_seq.advance();
    }

    /// Append the chunk carried by `payload` to `packet`, decompressing into
    /// exactly `header.uncompressed_len` bytes when needed.
    pub(crate) fn decode_payload(
        &mut self,
        header: &FrameHeader,
        payload: &[u8],
        packet: &mut BytesMut,
    ) -> Result<()> {
        if !header.is_compressed() {
            packet.extend_from_slice(payload);
            return Ok(());
        }

        let start = packet.len();
        packet.resize(start + header.uncompressed_len, 0);
        if let Err(source) = self.engine.decompress(&mut packet[start..], payload) {
            packet.truncate(start);
            return Err(FrameError::Decompression {
                sequence_id: header.sequence_id,
                expected_len: header.uncompressed_len,
                source,
            });
        }
        Ok(())
    }

    /// Whether a chunk of `len` bytes ends its packet.
    pub(crate) fn is_final_chunk(&self, len: usize) -> bool {
        len < self.config.max_frame_payload
    }
}

/// Splits a packet into frame-sized chunks.
///
/// A packet whose length is a multiple of `max` (including an empty packet)
/// ends with an empty chunk, so the receiver always sees a short final chunk.
struct Chunks<'a> {
    rest: &'a [u8],
    max: usize,
    done: bool,
}

impl<'a> Chunks<'a> {
    fn new(packet: &'a [u8], max: usize) -> Self {
        Self {
            rest: packet,
            max,
            done: false,
        }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        if self.done {
            return None;
        }
        let (chunk, rest) = self.rest.split_at(self.rest.len().min(self.max));
        self.rest = rest;
        self.done = chunk.len() < self.max;
        Some(chunk)
    }
}
