use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod echo;
pub mod encode;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode frames from a file or stdin and print them.
    Decode(DecodeArgs),
    /// Encode frames into wire bytes.
    Encode(EncodeArgs),
    /// Loop frames received on a device back to the sender.
    Echo(EchoArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Decode(args) => decode::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Echo(args) => echo::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Input file. Reads stdin when absent.
    pub input: Option<PathBuf>,
    /// Only print these channels (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub channels: Option<Vec<u8>>,
    /// Exit after printing N frames.
    #[arg(long)]
    pub count: Option<usize>,
    /// Read buffer size in bytes.
    #[arg(long, value_name = "BYTES", env = "VBUS_BUFFER_CAPACITY")]
    pub buffer_capacity: Option<usize>,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Frame to encode as CHANNEL=PAYLOAD (repeatable).
    #[arg(long = "frame", value_name = "CH=PAYLOAD", required = true)]
    pub frames: Vec<String>,
    /// Treat payloads as hex strings.
    #[arg(long)]
    pub hex: bool,
    /// Write the wire bytes to a file instead of stdout.
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct EchoArgs {
    /// Device to open read/write (serial port, FIFO).
    pub device: PathBuf,
    /// Channels to echo (comma-separated). Default: all channels.
    #[arg(long, value_delimiter = ',')]
    pub channels: Option<Vec<u8>>,
    /// Exit after echoing N frames.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn channel_selected(channels: Option<&[u8]>, channel: u8) -> bool {
    channels.is_none_or(|set| set.contains(&channel))
}
