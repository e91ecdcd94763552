use std::fs::OpenOptions;
use std::io::{Read, Write};

use tracing::{debug, info};
use vbus_frame::{FrameError, FrameReader, FrameWriter};

use crate::cmd::{channel_selected, EchoArgs};
use crate::exit::{frame_error, io_error, CliResult, SUCCESS};
use crate::output::{print_frames, OutputFormat};

pub fn run(args: EchoArgs, format: OutputFormat) -> CliResult<i32> {
    let device = OpenOptions::new()
        .read(true)
        .write(true)
        .open(&args.device)
        .map_err(|err| io_error(&format!("failed opening {}", args.device.display()), err))?;
    let writer = device
        .try_clone()
        .map_err(|err| io_error("failed cloning device handle", err))?;

    info!(device = %args.device.display(), "echo loop started");
    let echoed = echo_frames(
        device,
        writer,
        args.channels.as_deref(),
        args.count,
        Some(format),
    )?;
    info!(frames = echoed, "echo loop finished");

    Ok(SUCCESS)
}

/// Decode frames from `input` and write each selected batch back to `output`.
///
/// Returns the number of frames echoed once the input closes or `count`
/// frames have been sent.
pub(crate) fn echo_frames<R: Read, W: Write>(
    input: R,
    output: W,
    channels: Option<&[u8]>,
    count: Option<usize>,
    format: Option<OutputFormat>,
) -> CliResult<usize> {
    let mut reader = FrameReader::new(input);
    let mut writer = FrameWriter::new(output);
    let mut echoed = 0usize;

    loop {
        let batch = match reader.read_frames() {
            Ok(batch) => batch,
            Err(FrameError::ConnectionClosed) => return Ok(echoed),
            Err(err) => return Err(frame_error("receive failed", err)),
        };

        let mut selected: Vec<_> = batch
            .into_iter()
            .filter(|frame| channel_selected(channels, frame.channel))
            .collect();
        if let Some(count) = count {
            selected.truncate(count.saturating_sub(echoed));
        }

        if !selected.is_empty() {
            writer
                .write_frames(&selected)
                .map_err(|err| frame_error("send failed", err))?;
            debug!(frames = selected.len(), "echoed batch");
            if let Some(format) = format {
                print_frames(&selected, format);
            }
            echoed = echoed.saturating_add(selected.len());
        }

        if count.is_some_and(|count| echoed >= count) {
            return Ok(echoed);
        }
    }
}
