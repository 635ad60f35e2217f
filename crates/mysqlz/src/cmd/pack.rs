use std::io::Cursor;

use mysqlz_frame::{inspect_frames, Framer};
use tracing::info;

use crate::cmd::{read_input, PackArgs};
use crate::exit::{frame_error, io_error, CliResult, SUCCESS};
use crate::output::{print_raw, print_summary, OutputFormat, PackSummary};

pub fn run(args: PackArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.framing.to_config()?;
    let mut framer = Framer::new(Cursor::new(Vec::new()), config)
        .map_err(|err| frame_error("framer setup failed", err))?;

    let mut summary = PackSummary::default();
    for path in &args.inputs {
        let packet = read_input(path)?;
        framer.write_packet(&packet).map_err(|err| {
            frame_error(&format!("packing {} failed", path.display()), err)
        })?;
        summary.packets += 1;
        summary.input_bytes += packet.len();
    }

    let wire = framer.into_inner().into_inner();
    for frame in inspect_frames(&wire) {
        let frame = frame.map_err(|err| frame_error("re-reading packed stream failed", err))?;
        summary.frames += 1;
        if frame.compressed {
            summary.compressed_frames += 1;
        }
    }
    summary.wire_bytes = wire.len();

    info!(
        packets = summary.packets,
        frames = summary.frames,
        input_bytes = summary.input_bytes,
        wire_bytes = summary.wire_bytes,
        "packed stream"
    );

    match &args.output {
        Some(path) => {
            std::fs::write(path, &wire).map_err(|err| {
                io_error(&format!("failed writing {}", path.display()), err)
            })?;
            print_summary(&summary, format);
        }
        None => print_raw(&wire),
    }

    Ok(SUCCESS)
}
