use std::fs;

use mysqlz_frame::Framer;
use mysqlz_transport::Endpoint;
use tracing::debug;

use crate::cmd::{parse_duration, SendArgs};
use crate::exit::{frame_error, io_error, transport_error, CliResult, SUCCESS};
use crate::output::{print_packet, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let mut config = args.framing.to_config()?;
    config.read_timeout = Some(timeout);
    config.write_timeout = Some(timeout);

    let endpoint: Endpoint = args
        .endpoint
        .parse()
        .map_err(|err| transport_error("invalid endpoint", err))?;
    let stream = endpoint
        .connect(Some(timeout))
        .map_err(|err| transport_error("connect failed", err))?;
    let source = stream.peer_label();
    let mut framer =
        Framer::with_stream(stream, config).map_err(|err| frame_error("connect failed", err))?;

    let payload = resolve_payload(&args)?;
    framer
        .write_packet(&payload)
        .map_err(|err| frame_error("send failed", err))?;
    debug!(size = payload.len(), peer = %source, "packet sent");

    if args.wait {
        let reply = framer
            .read_packet()
            .map_err(|err| frame_error("receive failed", err))?;
        print_packet(0, &reply, &source, format);
    }

    Ok(SUCCESS)
}

fn resolve_payload(args: &SendArgs) -> CliResult<Vec<u8>> {
    if let Some(data) = &args.data {
        return Ok(data.as_bytes().to_vec());
    }
    if let Some(path) = &args.file {
        return fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    Ok(Vec::new())
}
