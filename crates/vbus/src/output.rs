use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use vbus_frame::{Frame, HEADER_SIZE};

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
struct FrameOutput {
    channel: u8,
    size: usize,
    payload: String,
    payload_hex: String,
}

#[derive(Serialize)]
struct EncodedOutput {
    frames: usize,
    size: usize,
    hex: String,
}

/// Print one decoded batch. JSON is emitted one object per line.
pub fn print_frames(frames: &[Frame], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for frame in frames {
                let out = FrameOutput {
                    channel: frame.channel,
                    size: frame.size(),
                    payload: payload_preview(frame.payload.as_ref()),
                    payload_hex: hex::encode(&frame.payload),
                };
                println!(
                    "{}",
                    serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
                );
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CHANNEL", "SIZE", "PAYLOAD"]);
            for frame in frames {
                table.add_row(vec![
                    frame.channel.to_string(),
                    frame.size().to_string(),
                    payload_preview(frame.payload.as_ref()),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for frame in frames {
                println!(
                    "channel={} size={} payload={}",
                    frame.channel,
                    frame.size(),
                    payload_preview(frame.payload.as_ref())
                );
            }
        }
        OutputFormat::Raw => {
            for frame in frames {
                print_raw(frame.payload.as_ref());
            }
        }
    }
}

/// Print the result of an encode: the wire bytes themselves for `raw`,
/// otherwise a summary with the hex rendering.
pub fn print_encoded(frames: &[Frame], wire: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = EncodedOutput {
                frames: frames.len(),
                size: wire.len(),
                hex: hex::encode(wire),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["OFFSET", "CHANNEL", "SIZE", "BYTES"]);
            let mut offset = 0usize;
            for frame in frames {
                let end = offset + frame.wire_size();
                table.add_row(vec![
                    offset.to_string(),
                    frame.channel.to_string(),
                    frame.size().to_string(),
                    hex::encode(&wire[offset..end]),
                ]);
                offset = end;
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "frames={} size={} header={} hex={}",
                frames.len(),
                wire.len(),
                HEADER_SIZE,
                hex::encode(wire)
            );
        }
        OutputFormat::Raw => print_raw(wire),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_keeps_utf8_and_summarizes_binary() {
        assert_eq!(payload_preview(b"TEST"), "TEST");
        assert_eq!(payload_preview(&[0xFF, 0xFE]), "<binary 2 bytes>");
    }

    #[test]
    fn frame_output_serializes_hex() {
        let frame = Frame::new(2, "TEST");
        let out = FrameOutput {
            channel: frame.channel,
            size: frame.size(),
            payload: payload_preview(frame.payload.as_ref()),
            payload_hex: hex::encode(&frame.payload),
        };
        let json = serde_json::to_string(&out).unwrap();
        assert_eq!(
            json,
            r#"{"channel":2,"size":4,"payload":"TEST","payload_hex":"54455354"}"#
        );
    }
}
