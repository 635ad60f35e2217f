use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use mysqlz_frame::FrameInfo;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct PacketOutput<'a> {
    index: usize,
    source: &'a str,
    size: usize,
    payload: String,
}

pub fn print_packet(index: usize, payload: &[u8], source: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = PacketOutput {
                index,
                source,
                size: payload.len(),
                payload: payload_preview(payload),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = new_table(vec!["PACKET", "SIZE", "SOURCE", "PAYLOAD"]);
            table.add_row(vec![
                index.to_string(),
                payload.len().to_string(),
                source.to_string(),
                payload_preview(payload),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "packet={index} size={} source={source} payload={}",
                payload.len(),
                payload_preview(payload)
            );
        }
        OutputFormat::Raw => print_raw(payload),
    }
}

pub fn print_frames(frames: &[FrameInfo], format: OutputFormat) {
    match format {
        OutputFormat::Json | OutputFormat::Raw => print_json(&frames),
        OutputFormat::Table => {
            let mut table = new_table(vec![
                "OFFSET",
                "SEQ",
                "COMPRESSED",
                "WIRE LEN",
                "PAYLOAD LEN",
                "RATIO",
            ]);
            for frame in frames {
                table.add_row(vec![
                    frame.offset.to_string(),
                    frame.header.sequence_id.to_string(),
                    if frame.compressed { "yes" } else { "no" }.to_string(),
                    frame.header.compressed_len.to_string(),
                    frame.header.payload_len().to_string(),
                    ratio(frame),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for frame in frames {
                println!(
                    "offset={} seq={} compressed={} wire_len={} payload_len={} ratio={}",
                    frame.offset,
                    frame.header.sequence_id,
                    frame.compressed,
                    frame.header.compressed_len,
                    frame.header.payload_len(),
                    ratio(frame)
                );
            }
        }
    }
}

/// Counters reported by `pack`.
#[derive(Debug, Default, Serialize)]
pub struct PackSummary {
    pub packets: usize,
    pub frames: usize,
    pub compressed_frames: usize,
    pub input_bytes: usize,
    pub wire_bytes: usize,
}

pub fn print_summary(summary: &PackSummary, format: OutputFormat) {
    match format {
        OutputFormat::Json | OutputFormat::Raw => print_json(summary),
        OutputFormat::Table => {
            let mut table = new_table(vec![
                "PACKETS",
                "FRAMES",
                "COMPRESSED",
                "INPUT BYTES",
                "WIRE BYTES",
            ]);
            table.add_row(vec![
                summary.packets.to_string(),
                summary.frames.to_string(),
                summary.compressed_frames.to_string(),
                summary.input_bytes.to_string(),
                summary.wire_bytes.to_string(),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "packets={} frames={} compressed={} input_bytes={} wire_bytes={}",
                summary.packets,
                summary.frames,
                summary.compressed_frames,
                summary.input_bytes,
                summary.wire_bytes
            );
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BoundOutput {
    pub len: usize,
    pub bound: usize,
}

pub fn print_bounds(bounds: &[BoundOutput], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&bounds),
        OutputFormat::Table => {
            let mut table = new_table(vec!["INPUT LEN", "BOUND"]);
            for bound in bounds {
                table.add_row(vec![bound.len.to_string(), bound.bound.to_string()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for bound in bounds {
                println!("{} {}", bound.len, bound.bound);
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn ratio(frame: &FrameInfo) -> String {
    match frame.header.payload_len() {
        0 => "-".to_string(),
        len => format!("{:.2}", frame.header.compressed_len as f64 / len as f64),
    }
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}

#[cfg(test)]
mod tests {
    use mysqlz_frame::FrameHeader;

    use super::*;

    #[test]
    fn ratio_of_compressed_frame() {
        let frame = FrameInfo {
            offset: 0,
            header: FrameHeader {
                compressed_len: 25,
                sequence_id: 0,
                uncompressed_len: 100,
            },
            compressed: true,
        };
        assert_eq!(ratio(&frame), "0.25");

        let empty = FrameInfo {
            header: FrameHeader::passthrough(1, 0),
            compressed: false,
            ..frame
        };
        assert_eq!(ratio(&empty), "-");
    }

    #[test]
    fn binary_payload_preview() {
        assert_eq!(payload_preview(b"SELECT 1"), "SELECT 1");
        assert_eq!(payload_preview(&[0xFF, 0xFE]), "<binary 2 bytes>");
    }
}
