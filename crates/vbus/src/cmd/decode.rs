use std::fs::File;
use std::io::{self, Read};

use tracing::{debug, warn};
use vbus_frame::{FrameConfig, FrameError, FrameReader};

use crate::cmd::{channel_selected, DecodeArgs};
use crate::exit::{frame_error, io_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_frames, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let input: Box<dyn Read> = match &args.input {
        Some(path) => Box::new(File::open(path).map_err(|err| {
            io_error(&format!("failed opening {}", path.display()), err)
        })?),
        None => Box::new(io::stdin().lock()),
    };

    let mut config = FrameConfig::default();
    if let Some(capacity) = args.buffer_capacity {
        if capacity == 0 {
            return Err(CliError::new(USAGE, "--buffer-capacity must be > 0"));
        }
        config.buffer_capacity = capacity;
    }

    let mut reader = FrameReader::with_config(input, config);
    let mut printed = 0usize;

    loop {
        let batch = match reader.read_frames() {
            Ok(batch) => batch,
            Err(FrameError::ConnectionClosed) => break,
            Err(err) => return Err(frame_error("decode failed", err)),
        };
        debug!(frames = batch.len(), "decoded batch");

        let mut selected: Vec<_> = batch
            .into_iter()
            .filter(|frame| channel_selected(args.channels.as_deref(), frame.channel))
            .collect();
        if let Some(count) = args.count {
            selected.truncate(count.saturating_sub(printed));
        }
        if !selected.is_empty() {
            print_frames(&selected, format);
            printed = printed.saturating_add(selected.len());
        }

        if args.count.is_some_and(|count| printed >= count) {
            return Ok(SUCCESS);
        }
    }

    if reader.buffered() > 0 {
        warn!(
            bytes = reader.buffered(),
            "input ended inside a frame; trailing bytes ignored"
        );
    }

    Ok(SUCCESS)
}
