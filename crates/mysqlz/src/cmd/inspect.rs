use mysqlz_frame::inspect_frames;

use crate::cmd::{read_input, InspectArgs};
use crate::exit::{capture_error, CliResult, SUCCESS};
use crate::output::{print_frames, OutputFormat};

pub fn run(args: InspectArgs, format: OutputFormat) -> CliResult<i32> {
    let wire = read_input(&args.input)?;
    let frames = inspect_frames(&wire)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| capture_error("inspect failed", err))?;
    print_frames(&frames, format);
    Ok(SUCCESS)
}
