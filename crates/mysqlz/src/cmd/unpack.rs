use std::io::Cursor;

use mysqlz_frame::Framer;
use tracing::info;

use crate::cmd::{read_input, UnpackArgs};
use crate::exit::{capture_error, frame_error, io_error, CliResult, SUCCESS};
use crate::output::{print_packet, OutputFormat};

pub fn run(args: UnpackArgs, format: OutputFormat) -> CliResult<i32> {
    let wire = read_input(&args.input)?;
    let source = args.input.display().to_string();
    let config = args.framing.to_config()?;
    let mut framer = Framer::new(Cursor::new(wire), config)
        .map_err(|err| frame_error("framer setup failed", err))?;

    let mut combined = Vec::new();
    let mut count = 0usize;
    let mut bytes = 0usize;
    while let Some(packet) = framer
        .try_read_packet()
        .map_err(|err| capture_error(&format!("unpacking packet {count} failed"), err))?
    {
        match &args.output {
            Some(_) => combined.extend_from_slice(&packet),
            None => print_packet(count, &packet, &source, format),
        }
        bytes += packet.len();
        count += 1;
    }

    if let Some(path) = &args.output {
        std::fs::write(path, &combined)
            .map_err(|err| io_error(&format!("failed writing {}", path.display()), err))?;
    }
    info!(packets = count, bytes, "unpacked stream");

    Ok(SUCCESS)
}
