mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "vbus", version, about = "Multiplexed virtual bus framing CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        default_value = "info",
        env = "VBUS_LOG_LEVEL",
        global = true
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_encode_subcommand() {
        let cli = Cli::try_parse_from([
            "vbus", "encode", "--frame", "5=ABC", "--frame", "2=TEST",
        ])
        .expect("encode args should parse");

        match cli.command {
            Command::Encode(args) => assert_eq!(args.frames.len(), 2),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn encode_requires_a_frame() {
        let err = Cli::try_parse_from(["vbus", "encode"]).expect_err("missing frame should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn parses_decode_with_channel_filter() {
        let cli = Cli::try_parse_from([
            "vbus",
            "--format",
            "json",
            "decode",
            "capture.bin",
            "--channels",
            "1,3",
            "--count",
            "4",
        ])
        .expect("decode args should parse");

        match cli.command {
            Command::Decode(args) => {
                assert_eq!(args.channels, Some(vec![1, 3]));
                assert_eq!(args.count, Some(4));
                assert!(args.input.is_some());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_channel_out_of_range() {
        let err = Cli::try_parse_from(["vbus", "decode", "--channels", "256"])
            .expect_err("channel 256 should be rejected");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
