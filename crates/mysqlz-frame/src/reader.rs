use bytes::{Bytes, BytesMut};
use mysqlz_transport::{Transport, TransportError};
use tracing::{debug, trace};

use crate::error::{FrameError, Result};
use crate::framer::Framer;
use crate::header::{FrameHeader, HEADER_SIZE};

impl<T: Transport> Framer<T> {
    /// Read the next complete packet (blocking).
    ///
    /// Returns `Err(FrameError::Transport(TransportError::UnexpectedEof { .. }))`
    /// when the stream ends, even between packets.
    pub fn read_packet(&mut self) -> Result<Bytes> {
        match self.try_read_packet()? {
            Some(packet) => Ok(packet),
            None => {
                self.context.poison();
                Err(FrameError::Transport(TransportError::UnexpectedEof {
                    expected: HEADER_SIZE,
                    received: 0,
                }))
            }
        }
    }

    /// Read the next complete packet, or `None` if the stream ends cleanly
    /// before the first byte of a new packet.
    ///
    /// A stream that ends anywhere else is an error. No partial packet is
    /// ever returned.
    pub fn try_read_packet(&mut self) -> Result<Option<Bytes>> {
        self.context.ensure_usable()?;
        let result = self.receive_frames();
        if result.is_err() {
            self.context.poison();
        }
        result
    }

    fn receive_frames(&mut self) -> Result<Option<Bytes>> {
        let first_sequence = self.context.recv_sequence();
        let mut packet = BytesMut::new();
        let mut frames = 0usize;

        loop {
            let mut raw = [0u8; HEADER_SIZE];
            match self.inner.read_exactly(&mut raw) {
                Ok(()) => {}
                Err(TransportError::UnexpectedEof { received: 0, .. }) if frames == 0 => {
                    return Ok(None)
                }
                Err(err) => return Err(err.into()),
            }

            let header = FrameHeader::decode(raw);
            self.context.check_header(&header, packet.len())?;
            self.context.accept_header();

            if header.is_compressed() {
                let mut payload = self.pool.acquire(header.compressed_len);
                self.inner
                    .read_exactly(payload.zeroed(header.compressed_len))?;
                self.context.decode_payload(&header, &payload, &mut packet)?;
            } else {
                let start = packet.len();
                packet.resize(start + header.compressed_len, 0);
                self.inner.read_exactly(&mut packet[start..])?;
            }

            frames += 1;
            trace!(
                sequence_id = header.sequence_id,
                compressed_len = header.compressed_len,
                uncompressed_len = header.uncompressed_len,
                "received frame"
            );
            if self.context.is_final_chunk(header.payload_len()) {
                break;
            }
        }

        debug!(
            first_sequence,
            frames,
            packet_len = packet.len(),
            "received packet"
        );
        Ok(Some(packet.freeze()))
    }
}
