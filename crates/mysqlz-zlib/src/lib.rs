//! zlib compression engine and buffer pool for the MySQL compressed protocol.
//!
//! Each compressed frame carries one complete zlib stream. This crate wraps
//! flate2 with the buffer-in, buffer-out calls the framer needs:
//! [`compress_bound`], [`compress`], and exact-size [`decompress`], plus a
//! reusable per-connection [`ZlibEngine`].
//!
//! [`BufferPool`] hands out scratch buffers so steady-state traffic does not
//! allocate per frame.

pub mod engine;
pub mod error;
pub mod pool;

pub use engine::{compress, compress_bound, decompress, Level, ZlibEngine};
pub use error::{Result, ZlibCode, ZlibError};
pub use pool::{BufferPool, PoolStats, PooledBuffer};
