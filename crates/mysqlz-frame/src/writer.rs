use mysqlz_transport::Transport;
use mysqlz_zlib::compress_bound;
use tracing::debug;

use crate::error::Result;
use crate::framer::Framer;
use crate::header::HEADER_SIZE;

impl<T: Transport> Framer<T> {
    /// Frame and send one packet (blocking).
    ///
    /// Packets longer than the maximum frame payload are split; each chunk is
    /// compressed on its own and consumes one sequence id. Chunks that are
    /// short, or that do not shrink, are sent verbatim.
    pub fn write_packet(&mut self, packet: &[u8]) -> Result<()> {
        self.context.ensure_usable()?;
        let result = self.send_frames(packet);
        if result.is_err() {
            self.context.poison();
        }
        result
    }

    fn send_frames(&mut self, packet: &[u8]) -> Result<()> {
        let first_chunk = packet.len().min(self.context.config().max_frame_payload);
        let mut wire = self.pool.acquire(HEADER_SIZE + compress_bound(first_chunk));

        let first_sequence = self.context.send_sequence();
        self.context.encode_packet(packet, &mut wire)?;
        self.inner.write_bytes(&wire)?;

        debug!(
            first_sequence,
            packet_len = packet.len(),
            wire_len = wire.len(),
            "sent packet"
        );
        Ok(())
    }
}
