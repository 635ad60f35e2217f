use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use mysqlz_frame::{FrameError, Framer, FramerConfig};
use mysqlz_transport::{Endpoint, WireListener, WireStream};
use mysqlz_zlib::BufferPool;
use tracing::{info, warn};

use crate::cmd::{parse_duration, EchoArgs};
use crate::exit::{transport_error, CliError, CliResult, SUCCESS};
use crate::output::OutputFormat;

pub fn run(args: EchoArgs, _format: OutputFormat) -> CliResult<i32> {
    let mut config = args.framing.to_config()?;
    if let Some(idle) = &args.idle_timeout {
        config.read_timeout = Some(parse_duration(idle)?);
    }

    let endpoint: Endpoint = args
        .endpoint
        .parse()
        .map_err(|err| transport_error("invalid endpoint", err))?;
    let listener =
        WireListener::bind(&endpoint).map_err(|err| transport_error("bind failed", err))?;
    info!(
        endpoint = %listener
            .local_endpoint()
            .map(|ep| ep.to_string())
            .unwrap_or_else(|_| endpoint.to_string()),
        compress = config.compression.enabled,
        "echo server listening"
    );

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let pool = Arc::new(BufferPool::new());
    let mut served = 0usize;
    while running.load(Ordering::SeqCst) {
        if args.connections.is_some_and(|limit| served >= limit) {
            break;
        }
        let stream = listener
            .accept()
            .map_err(|err| transport_error("accept failed", err))?;
        let peer = stream.peer_label();
        served += 1;

        match serve(stream, config.clone(), &pool, &running) {
            Ok(packets) => info!(peer = %peer, packets, "connection closed"),
            Err(err) => warn!(peer = %peer, error = %err, "dropping connection"),
        }
    }

    let stats = pool.stats();
    info!(
        connections = served,
        buffers_allocated = stats.allocated,
        buffers_reused = stats.reused,
        "echo server stopped"
    );
    Ok(SUCCESS)
}

/// Echo every packet back until the peer closes the stream.
fn serve(
    stream: WireStream,
    config: FramerConfig,
    pool: &Arc<BufferPool>,
    running: &AtomicBool,
) -> Result<usize, FrameError> {
    stream.set_read_timeout(config.read_timeout)?;
    stream.set_write_timeout(config.write_timeout)?;
    let mut framer = Framer::with_pool(stream, config, Arc::clone(pool))?;

    let mut packets = 0usize;
    while running.load(Ordering::SeqCst) {
        let Some(packet) = framer.try_read_packet()? else {
            break;
        };
        framer.write_packet(&packet)?;
        packets += 1;
    }
    Ok(packets)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
