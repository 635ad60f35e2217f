use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Subcommand};
use mysqlz_frame::{
    CompressionConfig, FramerConfig, DEFAULT_MAX_FRAME_PAYLOAD, DEFAULT_MIN_COMPRESS_LEN,
};

use crate::exit::{frame_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod bound;
pub mod echo;
pub mod inspect;
pub mod pack;
pub mod send;
pub mod unpack;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Frame packets from files into a compressed-protocol stream.
    Pack(PackArgs),
    /// Reassemble packets from a compressed-protocol stream.
    Unpack(UnpackArgs),
    /// List the frames of a captured stream.
    Inspect(InspectArgs),
    /// Print the worst-case compressed size for input lengths.
    Bound(BoundArgs),
    /// Start an echo server speaking the compressed protocol.
    Echo(EchoArgs),
    /// Send a single packet.
    Send(SendArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Pack(args) => pack::run(args, format),
        Command::Unpack(args) => unpack::run(args, format),
        Command::Inspect(args) => inspect::run(args, format),
        Command::Bound(args) => bound::run(args, format),
        Command::Echo(args) => echo::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Framing options shared by every command that reads or writes frames.
#[derive(Args, Debug, Clone)]
pub struct FramingArgs {
    /// Compress outbound frames.
    #[arg(long)]
    pub compress: bool,
    /// zlib compression level (0-9).
    #[arg(long, default_value_t = 6)]
    pub level: u32,
    /// Take compression settings from a DSN query string (compress, compressionLevel).
    #[arg(long, value_name = "DSN", conflicts_with_all = ["compress", "level"])]
    pub dsn: Option<String>,
    /// Chunks shorter than this are sent uncompressed.
    #[arg(long, default_value_t = DEFAULT_MIN_COMPRESS_LEN)]
    pub min_compress_len: usize,
    /// Largest chunk carried by one frame.
    #[arg(long, default_value_t = DEFAULT_MAX_FRAME_PAYLOAD)]
    pub max_frame_payload: usize,
}

impl FramingArgs {
    pub fn to_config(&self) -> CliResult<FramerConfig> {
        let compression = match &self.dsn {
            Some(dsn) => {
                CompressionConfig::from_dsn(dsn).map_err(|err| frame_error("invalid --dsn", err))?
            }
            None => CompressionConfig {
                enabled: self.compress,
                level: self.level,
            },
        };
        let config = FramerConfig {
            compression,
            min_compress_len: self.min_compress_len,
            max_frame_payload: self.max_frame_payload,
            ..FramerConfig::default()
        };
        config
            .validate()
            .map_err(|err| frame_error("invalid framing options", err))?;
        Ok(config)
    }
}

#[derive(Args, Debug)]
pub struct PackArgs {
    /// Files to send, one packet per file ("-" reads stdin).
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,
    /// Write the frame stream here instead of stdout.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
    #[command(flatten)]
    pub framing: FramingArgs,
}

#[derive(Args, Debug)]
pub struct UnpackArgs {
    /// Captured frame stream ("-" reads stdin).
    pub input: PathBuf,
    /// Write the concatenated packets here instead of printing them.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
    #[command(flatten)]
    pub framing: FramingArgs,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Captured frame stream ("-" reads stdin).
    pub input: PathBuf,
}

#[derive(Args, Debug)]
pub struct BoundArgs {
    /// Input lengths in bytes.
    #[arg(required = true)]
    pub lengths: Vec<usize>,
}

#[derive(Args, Debug)]
pub struct EchoArgs {
    /// Endpoint to listen on (host:port, tcp://host:port, unix:/path or /path).
    pub endpoint: String,
    /// Exit after serving N connections.
    #[arg(long)]
    pub connections: Option<usize>,
    /// Per-read timeout for idle connections (e.g. 30s, 500ms).
    #[arg(long)]
    pub idle_timeout: Option<String>,
    #[command(flatten)]
    pub framing: FramingArgs,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Endpoint to connect to (host:port, tcp://host:port, unix:/path or /path).
    pub endpoint: String,
    /// Raw string payload.
    #[arg(long, conflicts_with = "file")]
    pub data: Option<String>,
    /// Read payload from file.
    #[arg(long, conflicts_with = "data")]
    pub file: Option<PathBuf>,
    /// Wait for one response packet and print it.
    #[arg(long)]
    pub wait: bool,
    /// Connect and read timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
    #[command(flatten)]
    pub framing: FramingArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn read_input(path: &Path) -> CliResult<Vec<u8>> {
    if path.as_os_str() == "-" {
        let mut buf = Vec::new();
        std::io::Read::read_to_end(&mut std::io::stdin(), &mut buf)
            .map_err(|err| crate::exit::io_error("failed reading stdin", err))?;
        return Ok(buf);
    }
    std::fs::read(path)
        .map_err(|err| crate::exit::io_error(&format!("failed reading {}", path.display()), err))
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
