use tracing::info;
use vbus_frame::{encode, Frame};

use crate::cmd::EncodeArgs;
use crate::exit::{frame_error, io_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_encoded, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let frames = args
        .frames
        .iter()
        .map(|arg| parse_frame_arg(arg, args.hex))
        .collect::<CliResult<Vec<_>>>()?;

    let wire = encode(&frames).map_err(|err| frame_error("encode failed", err))?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &wire).map_err(|err| {
                io_error(&format!("failed writing {}", path.display()), err)
            })?;
            info!(
                frames = frames.len(),
                bytes = wire.len(),
                path = %path.display(),
                "wrote encoded frames"
            );
        }
        None => print_encoded(&frames, &wire, format),
    }

    Ok(SUCCESS)
}

/// Parse `CHANNEL=PAYLOAD`. The payload is taken literally unless `hex` is set.
fn parse_frame_arg(arg: &str, hex: bool) -> CliResult<Frame> {
    let (channel, payload) = arg.split_once('=').ok_or_else(|| {
        CliError::new(USAGE, format!("invalid frame '{arg}': expected CH=PAYLOAD"))
    })?;

    let channel: u8 = channel.trim().parse().map_err(|_| {
        CliError::new(
            USAGE,
            format!("invalid channel '{channel}': expected 0-255"),
        )
    })?;

    let payload = if hex {
        hex::decode(payload)
            .map_err(|err| CliError::new(USAGE, format!("invalid hex payload: {err}")))?
    } else {
        payload.as_bytes().to_vec()
    };

    Ok(Frame::new(channel, payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_literal_payload() {
        let frame = parse_frame_arg("5=ABC", false).unwrap();
        assert_eq!(frame.channel, 5);
        assert_eq!(frame.payload.as_ref(), b"ABC");
    }

    #[test]
    fn payload_may_contain_equals() {
        let frame = parse_frame_arg("1=a=b", false).unwrap();
        assert_eq!(frame.payload.as_ref(), b"a=b");
    }

    #[test]
    fn parses_hex_payload() {
        let frame = parse_frame_arg("2=54455354", true).unwrap();
        assert_eq!(frame.channel, 2);
        assert_eq!(frame.payload.as_ref(), b"TEST");
    }

    #[test]
    fn empty_payload_is_allowed() {
        let frame = parse_frame_arg("7=", false).unwrap();
        assert_eq!(frame.size(), 0);
    }

    #[test]
    fn rejects_malformed_frames() {
        assert_eq!(parse_frame_arg("ABC", false).unwrap_err().code, USAGE);
        assert_eq!(parse_frame_arg("256=x", false).unwrap_err().code, USAGE);
        assert_eq!(parse_frame_arg("1=zz", true).unwrap_err().code, USAGE);
    }
}
