//! Byte-stream transport adapter for the MySQL compressed protocol.
//!
//! The framer only needs two operations from a connection: read exactly `n`
//! bytes, and write a buffer. This crate provides:
//! - [`Transport`], implemented for every `Read + Write` type
//! - [`WireStream`], a TCP or Unix socket connection with timeouts and
//!   shutdown-based cancellation
//! - [`Endpoint`] and [`WireListener`] for connecting and accepting
//!
//! This is the lowest layer of mysqlz. Retries and reconnects belong to the
//! layer that owns the connection.

pub mod endpoint;
pub mod error;
pub mod listener;
pub mod stream;
pub mod traits;

pub use endpoint::{Endpoint, DEFAULT_PORT};
pub use error::{Result, TransportError};
pub use listener::WireListener;
pub use stream::WireStream;
pub use traits::Transport;
