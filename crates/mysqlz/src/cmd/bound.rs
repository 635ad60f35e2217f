use mysqlz_zlib::compress_bound;

use crate::cmd::BoundArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_bounds, BoundOutput, OutputFormat};

pub fn run(args: BoundArgs, format: OutputFormat) -> CliResult<i32> {
    let bounds: Vec<_> = args
        .lengths
        .iter()
        .map(|&len| BoundOutput {
            len,
            bound: compress_bound(len),
        })
        .collect();
    print_bounds(&bounds, format);
    Ok(SUCCESS)
}
