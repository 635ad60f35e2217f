use std::sync::Arc;

use mysqlz_transport::WireStream;
use mysqlz_zlib::BufferPool;

use crate::config::FramerConfig;
use crate::context::CompressionContext;
use crate::error::Result;

/// Sends and receives whole packets over a compressed-protocol stream.
///
/// One framer per connection. It is not meant for concurrent callers; the
/// protocol is half-duplex request/response. Any error poisons the framer and
/// the connection must be discarded.
pub struct Framer<T> {
    pub(crate) inner: T,
    pub(crate) context: CompressionContext,
    pub(crate) pool: Arc<BufferPool>,
}

impl<T> Framer<T> {
    /// Create a framer with its own buffer pool.
    pub fn new(inner: T, config: FramerConfig) -> Result<Self> {
        Self::with_pool(inner, config, Arc::new(BufferPool::new()))
    }

    /// Create a framer drawing scratch buffers from a shared pool.
    pub fn with_pool(inner: T, config: FramerConfig, pool: Arc<BufferPool>) -> Result<Self> {
        Ok(Self {
            inner,
            context: CompressionContext::new(config)?,
            pool,
        })
    }

    /// Restart both sequence counters at 0, as at the start of a new command.
    pub fn reset_sequences(&mut self) {
        self.context.reset_sequences();
    }

    /// Sequence id the next outbound frame will carry.
    pub fn send_sequence(&self) -> u8 {
        self.context.send_sequence()
    }

    /// Sequence id expected on the next inbound frame.
    pub fn recv_sequence(&self) -> u8 {
        self.context.recv_sequence()
    }

    /// Whether an earlier error has made the framer unusable.
    pub fn is_poisoned(&self) -> bool {
        self.context.is_poisoned()
    }

    pub fn compression_enabled(&self) -> bool {
        self.context.compression_enabled()
    }

    pub fn config(&self) -> &FramerConfig {
        self.context.config()
    }

    /// The buffer pool used for frame scratch space.
    pub fn pool(&self) -> &Arc<BufferPool> {
        &self.pool
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the framer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl Framer<WireStream> {
    /// Create a framer for a socket and apply the configured timeouts.
    pub fn with_stream(stream: WireStream, config: FramerConfig) -> Result<Self> {
        stream.set_read_timeout(config.read_timeout)?;
        stream.set_write_timeout(config.write_timeout)?;
        Self::new(stream, config)
    }
}

impl<T> std::fmt::Debug for Framer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Framer")
            .field("context", &self.context)
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}
