use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use bytes::BytesMut;

/// A thread-safe pool of reusable byte buffers.
///
/// Buffers are handed out as [`PooledBuffer`] guards that return the buffer
/// (cleared, capacity kept) when dropped. A guard borrows the pool, so a
/// buffer can never outlive the pool it came from or be handed out twice.
#[derive(Default)]
pub struct BufferPool {
    free: Mutex<Vec<BytesMut>>,
    acquired: AtomicU64,
    reused: AtomicU64,
    allocated: AtomicU64,
    released: AtomicU64,
}

/// Counters describing pool activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Buffers handed out.
    pub acquired: u64,
    /// Acquisitions satisfied by an idle buffer.
    pub reused: u64,
    /// Acquisitions that allocated a new buffer.
    pub allocated: u64,
    /// Buffers given back.
    pub released: u64,
    /// Buffers currently idle in the pool.
    pub idle: usize,
}

impl PoolStats {
    /// Buffers currently checked out.
    pub fn outstanding(&self) -> u64 {
        self.acquired.saturating_sub(self.released)
    }
}

impl BufferPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take an empty buffer with at least `min_capacity` bytes of capacity.
    ///
    /// The smallest idle buffer that fits is reused; otherwise a new one is
    /// allocated.
    pub fn acquire(&self, min_capacity: usize) -> PooledBuffer<'_> {
        self.acquired.fetch_add(1, Ordering::Relaxed);

        let idle = {
            let mut free = self.lock();
            free.iter()
                .enumerate()
                .filter(|(_, buf)| buf.capacity() >= min_capacity)
                .min_by_key(|(_, buf)| buf.capacity())
                .map(|(idx, _)| idx)
                .map(|idx| free.swap_remove(idx))
        };

        let buf = match idle {
            Some(buf) => {
                self.reused.fetch_add(1, Ordering::Relaxed);
                buf
            }
            None => {
                self.allocated.fetch_add(1, Ordering::Relaxed);
                BytesMut::with_capacity(min_capacity)
            }
        };

        PooledBuffer { buf, pool: self }
    }

    /// Number of idle buffers.
    pub fn idle(&self) -> usize {
        self.lock().len()
    }

    /// Snapshot of the pool counters.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            acquired: self.acquired.load(Ordering::Relaxed),
            reused: self.reused.load(Ordering::Relaxed),
            allocated: self.allocated.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
            idle: self.idle(),
        }
    }

    fn release(&self, mut buf: BytesMut) {
        buf.clear();
        self.released.fetch_add(1, Ordering::Relaxed);
        self.lock().push(buf);
    }

    // A panic while holding the lock cannot leave the free list inconsistent.
    fn lock(&self) -> MutexGuard<'_, Vec<BytesMut>> {
        self.free.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferPool")
            .field("stats", &self.stats())
            .finish()
    }
}

/// A buffer checked out of a [`BufferPool`].
///
/// Dereferences to [`BytesMut`]. Dropping the guard returns the buffer.
pub struct PooledBuffer<'a> {
    buf: BytesMut,
    pool: &'a BufferPool,
}

impl PooledBuffer<'_> {
    /// Resize to exactly `len` zeroed bytes, for use as an output slice.
    pub fn zeroed(&mut self, len: usize) -> &mut [u8] {
        self.buf.clear();
        self.buf.resize(len, 0);
        &mut self.buf[..]
    }
}

impl Deref for PooledBuffer<'_> {
    type Target = BytesMut;

    fn deref(&self) -> &BytesMut {
        &self.buf
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut BytesMut {
        &mut self.buf
    }
}

impl fmt::Debug for PooledBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledBuffer")
            .field("len", &self.buf.len())
            .field("capacity", &self.buf.capacity())
            .finish()
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buf));
    }
}
