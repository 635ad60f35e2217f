//! Minimal compressed-protocol echo server: accepts one client and echoes
//! packets back until it disconnects.
//!
//! Run with:
//!   cargo run --example echo
//!
//! In another terminal:
//!   cargo run --features cli -- send /tmp/mysqlz-echo-<pid>/echo.sock \
//!     --compress --data 'SELECT 1' --wait

use std::fs;

use mysqlz::transport::{Endpoint, WireListener};
use mysqlz::{CompressionConfig, Framer, FramerConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let sock_dir = std::env::temp_dir().join(format!("mysqlz-echo-{}", std::process::id()));
    fs::create_dir_all(&sock_dir)?;
    let endpoint = Endpoint::Unix(sock_dir.join("echo.sock"));

    let listener = WireListener::bind(&endpoint)?;
    eprintln!("Listening on {endpoint}");

    let stream = listener.accept()?;
    eprintln!("Client connected: {}", stream.peer_label());

    let config = FramerConfig::with_compression(CompressionConfig::enabled());
    let mut framer = Framer::with_stream(stream, config)?;
    loop {
        match framer.try_read_packet() {
            Ok(Some(packet)) => {
                eprintln!(
                    "Received {} bytes (next sequence id {})",
                    packet.len(),
                    framer.recv_sequence()
                );
                framer.write_packet(&packet)?;
            }
            Ok(None) => {
                eprintln!("Client disconnected");
                break;
            }
            Err(e) => {
                eprintln!("Dropping client: {e}");
                break;
            }
        }
    }

    drop(listener);
    let _ = fs::remove_dir_all(&sock_dir);
    Ok(())
}
