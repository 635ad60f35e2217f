use std::time::Duration;

use mysqlz_zlib::Level;
use serde::{Deserialize, Serialize};

use crate::error::{FrameError, Result};
use crate::header::{HEADER_SIZE, MAX_PAYLOAD_LEN};

/// The `CLIENT_COMPRESS` capability flag exchanged in the handshake.
pub const CLIENT_COMPRESS: u32 = 1 << 5;

/// Chunks shorter than this are sent verbatim.
pub const DEFAULT_MIN_COMPRESS_LEN: usize = 50;

/// Default chunk size at which a packet is split across frames.
pub const DEFAULT_MAX_FRAME_PAYLOAD: usize = MAX_PAYLOAD_LEN - HEADER_SIZE;

/// Default limit on a reassembled packet: 1 GiB, the server's own ceiling.
pub const DEFAULT_MAX_PACKET_SIZE: usize = 1 << 30;

/// Whether to compress, and how hard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Compress frames. Only takes effect after [`CompressionConfig::negotiate`].
    pub enabled: bool,
    /// zlib level, 0–9.
    pub level: u32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: Level::DEFAULT.get(),
        }
    }
}

impl CompressionConfig {
    /// Compression on at the default level.
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    /// Read `compress` and `compressionLevel` from the query string of a DSN.
    ///
    /// Other parameters are ignored. `compress` accepts `true`, `false`, `1`
    /// or `0` in any case.
    pub fn from_dsn(dsn: &str) -> Result<Self> {
        let mut config = Self::default();
        let Some((_, query)) = dsn.split_once('?') else {
            return Ok(config);
        };

        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            match key {
                "compress" => {
                    config.enabled = parse_flag(value).ok_or_else(|| {
                        FrameError::configuration(format!(
                            "compress must be true or false, got {value:?}"
                        ))
                    })?;
                }
                "compressionLevel" => {
                    let level = value.parse::<u32>().map_err(|_| {
                        FrameError::configuration(format!(
                            "compressionLevel must be a number, got {value:?}"
                        ))
                    })?;
                    config.level = checked_level(level)?.get();
                }
                _ => {}
            }
        }
        Ok(config)
    }

    /// The validated compression level.
    pub fn level(&self) -> Result<Level> {
        checked_level(self.level)
    }

    /// Capability bits a client advertises for this configuration.
    pub fn capability_flags(&self) -> u32 {
        if self.enabled {
            CLIENT_COMPRESS
        } else {
            0
        }
    }

    /// The configuration in effect once both sides have advertised their
    /// capabilities. Compression stays on only if requested and supported by both.
    pub fn negotiate(&self, client_capabilities: u32, server_capabilities: u32) -> Self {
        let both = client_capabilities & server_capabilities & CLIENT_COMPRESS != 0;
        Self {
            enabled: self.enabled && both,
            level: self.level,
        }
    }
}

/// Settings for a [`Framer`](crate::Framer) or [`CompressedCodec`](crate::codec::CompressedCodec).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FramerConfig {
    /// Negotiated compression settings.
    pub compression: CompressionConfig,
    /// Chunks shorter than this are never compressed. Default: 50.
    pub min_compress_len: usize,
    /// Largest chunk per frame. Default: 16 MiB − 1 − 7.
    pub max_frame_payload: usize,
    /// Largest reassembled packet accepted or sent. Default: 1 GiB.
    pub max_packet_size: usize,
    /// Read timeout applied to a [`WireStream`](mysqlz_transport::WireStream).
    pub read_timeout: Option<Duration>,
    /// Write timeout applied to a [`WireStream`](mysqlz_transport::WireStream).
    pub write_timeout: Option<Duration>,
}

impl Default for FramerConfig {
    fn default() -> Self {
        Self {
            compression: CompressionConfig::default(),
            min_compress_len: DEFAULT_MIN_COMPRESS_LEN,
            max_frame_payload: DEFAULT_MAX_FRAME_PAYLOAD,
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

impl FramerConfig {
    /// Default settings with the given compression.
    pub fn with_compression(compression: CompressionConfig) -> Self {
        Self {
            compression,
            ..Self::default()
        }
    }

    /// Check the settings, returning [`FrameError::Configuration`] on the first problem.
    pub fn validate(&self) -> Result<()> {
        self.compression.level()?;
        if self.max_frame_payload == 0 || self.max_frame_payload > MAX_PAYLOAD_LEN {
            return Err(FrameError::configuration(format!(
                "max_frame_payload must be in 1..={MAX_PAYLOAD_LEN}, got {}",
                self.max_frame_payload
            )));
        }
        if self.max_packet_size == 0 {
            return Err(FrameError::configuration(
                "max_packet_size must be greater than zero",
            ));
        }
        Ok(())
    }
}

fn checked_level(level: u32) -> Result<Level> {
    Level::new(level).map_err(|err| FrameError::configuration(err.to_string()))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}
