use std::fmt::Display;

use clap::{error::ErrorKind, value_parser, CommandFactory, Parser};

/// Standard input/output filename
pub const STDIO_FILE: &str = "-";

const USAGE_SHORT: &str = r#"
This program accepts synchronized burst bytes, splits them into fixed-length packets, decompresses each packet, and writes the recovered audio as signed 16-bit PCM. Packets which fail to decompress are dropped.

See --help for more details.
"#;

const USAGE_LONG: &str = r#"
This program accepts synchronized burst bytes, splits them into fixed-length packets, decompresses each packet, and writes the recovered audio as signed 16-bit PCM. Packets which fail to decompress are dropped.

Each --packet-len packet must begin with a zlib stream. Bytes after the end of the stream are padding and are ignored. Once decompressed, packets are concatenated into a mono, signed 16-bit, little-endian PCM stream.

Capture to a WAV file:

    burstdec --file bursts.bin --wav rx_capture.wav

Play live with sox:

    cat bursts.bin \
        | burstdec --raw - \
        | play -t raw -r 48k -e signed -b 16 -c 1 -

Inspect every packet as it arrives:

    burstdec --file bursts.bin --print-pdus
"#;

/// Highest accepted --rate (Hz)
const MAX_RATE: i64 = 1_000_000;

const ADVANCED: &str = "Advanced Options";

/// Top-level program arguments
#[derive(Parser, Clone, Debug)]
#[command(version)]
#[command(about, long_about = None)]
#[command(after_help = USAGE_SHORT, after_long_help = USAGE_LONG)]
#[command(max_term_width = 100)]
pub struct Args {
    /// Verbosity level (-vvv for more)
    #[arg(short, long, default_value_t = 0, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print NOTHING, not even a summary
    #[arg(short, long)]
    pub quiet: bool,

    /// Sampling rate of the recovered audio (Hz)
    ///
    /// Written to the --wav header. The raw output is not
    /// resampled.
    #[arg(short, long, default_value_t = 48000)]
    #[arg(value_parser = value_parser!(u32).range(1..=MAX_RATE))]
    pub rate: u32,

    /// Input file (or "-" for stdin)
    ///
    /// The input is the byte stream which follows the
    /// access code correlator.
    #[arg(long, default_value_t = STDIO_FILE.to_string())]
    pub file: String,

    /// Write audio to WAV file
    #[arg(long)]
    pub wav: Option<String>,

    /// Write audio as raw PCM (or "-" for stdout)
    #[arg(long)]
    pub raw: Option<String>,

    /// Print each received packet
    #[arg(long)]
    pub print_pdus: bool,

    /// Packet length (bytes)
    #[arg(long, default_value_t = 128)]
    #[arg(value_parser = value_parser!(u32).range(1..=65536))]
    #[arg(hide_short_help = true)]
    #[arg(help_heading = ADVANCED)]
    pub packet_len: u32,

    /// Maximum decompressed packet length (bytes)
    #[arg(long, default_value_t = 1048576)]
    #[arg(value_parser = value_parser!(u64).range(1..))]
    #[arg(hide_short_help = true)]
    #[arg(help_heading = ADVANCED)]
    pub max_payload_len: u64,
}

impl Args {
    /// Return true if the user requests input from stdin
    pub fn input_is_stdin(&self) -> bool {
        self.file == STDIO_FILE
    }

    /// Check for combinations of options which clap can't
    ///
    /// `--print-pdus` writes text to stdout, so it cannot
    /// share stdout with `--raw -`.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.print_pdus && self.raw.as_deref() == Some(STDIO_FILE) {
            Err(anyhow::anyhow!(
                "--print-pdus and --raw - both write to standard output"
            ))
        } else {
            Ok(())
        }
    }
}

/// A program-level error with exit code
#[derive(Debug)]
pub struct CliError {
    error: anyhow::Error,
    exit_code: i32,
}

impl CliError {
    /// Create new error with a custom exit code
    pub fn new(error: anyhow::Error, code: i32) -> CliError {
        CliError {
            error,
            exit_code: code,
        }
    }

    /// Print this error to the terminal
    ///
    /// Errors from clap are printed verbatim. Other types of errors
    /// are printed indirectly via clap's fancy formatter.
    pub fn print(&self) -> std::io::Result<()> {
        if let Some(e) = self.error.downcast_ref::<clap::Error>() {
            e.print()
        } else {
            Args::command()
                .error(ErrorKind::Format, self.to_string())
                .print()
        }
    }

    /// Print this error to the terminal and exit
    pub fn exit(&self) -> ! {
        drop(self.print());
        std::process::exit(self.exit_code);
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.error)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> CliError {
        CliError::new(err, 1)
    }
}

impl From<clap::Error> for CliError {
    fn from(err: clap::Error) -> CliError {
        let code = if err.use_stderr() { 1 } else { 0 };
        CliError::new(err.into(), code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clap() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["burstdec"]).unwrap();
        assert!(args.input_is_stdin());
        assert_eq!(args.packet_len, 128);
        assert_eq!(args.rate, 48000);
        assert_eq!(args.wav, None);

        let args = Args::try_parse_from(["burstdec", "-vv", "--packet-len", "64", "--raw", "-"])
            .unwrap();
        assert_eq!(args.verbose, 2);
        assert_eq!(args.packet_len, 64);
        assert_eq!(args.raw.as_deref(), Some(STDIO_FILE));

        assert!(Args::try_parse_from(["burstdec", "--packet-len", "0"]).is_err());
    }

    #[test]
    fn test_rate_range() {
        assert!(Args::try_parse_from(["burstdec", "--rate", "3000000000"]).is_err());
        assert!(Args::try_parse_from(["burstdec", "--rate", "0"]).is_err());

        let args = Args::try_parse_from(["burstdec", "-r", "1000000"]).unwrap();
        assert_eq!(args.rate, 1_000_000);
    }

    #[test]
    fn test_validate() {
        let args = Args::try_parse_from(["burstdec", "--print-pdus", "--raw", "-"]).unwrap();
        assert!(args.validate().is_err());

        let args =
            Args::try_parse_from(["burstdec", "--print-pdus", "--raw", "out.pcm"]).unwrap();
        assert!(args.validate().is_ok());

        let args = Args::try_parse_from(["burstdec", "--raw", "-"]).unwrap();
        assert!(args.validate().is_ok());
    }
}
