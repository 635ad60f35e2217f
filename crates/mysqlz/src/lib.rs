//! The MySQL compressed packet protocol layer.
//!
//! mysqlz lets a database client exchange zlib-compressed protocol packets
//! with a server while keeping the exact bytes of the uncompressed protocol.
//!
//! # Crate Structure
//!
//! - [`transport`]: byte-stream transport (TCP, Unix sockets)
//! - [`zlib`]: compression engine and buffer pool
//! - [`frame`]: compressed frame header, sequencing, splitting and reassembly
//!
//! ```no_run
//! use mysqlz::{CompressionConfig, Framer, FramerConfig};
//! use mysqlz::transport::Endpoint;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let compression = CompressionConfig::from_dsn("mysql://db:3306/app?compress=true")?;
//! let stream = "db:3306".parse::<Endpoint>()?.connect(None)?;
//! let mut framer = Framer::with_stream(stream, FramerConfig::with_compression(compression))?;
//! framer.write_packet(b"\x03SELECT 1")?;
//! let reply = framer.read_packet()?;
//! # let _ = reply;
//! # Ok(())
//! # }
//! ```

/// Re-export transport types.
pub mod transport {
    pub use mysqlz_transport::*;
}

/// Re-export compression engine and buffer pool types.
pub mod zlib {
    pub use mysqlz_zlib::*;
}

/// Re-export frame types.
pub mod frame {
    pub use mysqlz_frame::*;
}

pub use mysqlz_frame::{CompressionConfig, FrameError, Framer, FramerConfig};
