use mysqlz_frame::{
    CompressionConfig, DEFAULT_MAX_FRAME_PAYLOAD, DEFAULT_MAX_PACKET_SIZE,
    DEFAULT_MIN_COMPRESS_LEN,
};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("mysqlz {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    let build = |key: Option<&'static str>| key.unwrap_or("unknown");
    println!("name: mysqlz");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target: {}", build(option_env!("MYSQLZ_BUILD_TARGET")));
    println!("profile: {}", build(option_env!("MYSQLZ_BUILD_PROFILE")));
    println!("deflate: flate2");
    println!(
        "defaults: level={}, min_compress_len={}, max_frame_payload={}, max_packet_size={}",
        CompressionConfig::default().level,
        DEFAULT_MIN_COMPRESS_LEN,
        DEFAULT_MAX_FRAME_PAYLOAD,
        DEFAULT_MAX_PACKET_SIZE
    );
    println!("features: async={}, cli=true", cfg!(feature = "async"));

    Ok(SUCCESS)
}
