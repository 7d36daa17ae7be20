use std::fs::File;
use std::io;

use anyhow::{anyhow, Context};
use byteorder::ReadBytesExt;
use clap::Parser;
use log::{debug, info, LevelFilter};

mod app;
mod audio;
mod cli;

use audio::{AudioOut, RawPcm, WavFile};
use cli::{Args, CliError, STDIO_FILE};

fn main() {
    match burstdec() {
        Ok(()) => {}
        Err(cli_error) => cli_error.exit(),
    }
}

fn burstdec() -> Result<(), CliError> {
    // Parse options and start logging
    let args = Args::try_parse()?;
    log_setup(&args);

    args.validate()?;

    // file setup: locks stdin in case we need it
    let stdin = io::stdin();
    let stdin_handle = stdin.lock();
    let mut inbuf = file_setup(&args, stdin_handle)?;
    let mut outputs = output_setup(&args)?;

    let config = app::Config {
        packet_len: args.packet_len as usize,
        max_payload_len: usize::try_from(args.max_payload_len).unwrap_or(usize::MAX),
        print_pdus: args.print_pdus && !args.quiet,
    };

    // processing: read bytes from the input source
    let summary = app::run(
        &config,
        std::iter::from_fn(|| read_byte(&mut inbuf)),
        &mut outputs,
        &mut io::stdout(),
    )?;

    if !args.quiet && args.verbose == 0 {
        eprintln!("{}", summary);
    }

    Ok(())
}

fn log_setup(args: &Args) {
    if args.quiet {
        // no logging
        return;
    } else if std::env::var_os("RUST_LOG").is_none() {
        // parameter controls
        let log_filter = match args.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            3 | _ => LevelFilter::Trace,
        };

        pretty_env_logger::formatted_builder()
            .filter_module("burstrelay", log_filter)
            .filter_module("burstdec", log_filter)
            .init();
    } else {
        // environment controls
        pretty_env_logger::init();
    }
}

fn file_setup<'stdin>(
    args: &Args,
    stdin: std::io::StdinLock<'stdin>,
) -> Result<Box<dyn io::BufRead + 'stdin>, anyhow::Error> {
    if args.input_is_stdin() {
        info!("burst decoder reading standard input");
        if !is_terminal(&std::io::stdin()) {
            Ok(Box::new(io::BufReader::new(stdin)))
        } else {
            Err(anyhow!(
                "cowardly refusing to read burst data from a terminal.

Pipe the synchronized output of a burst receiver into this
program, or use --file."
            ))
        }
    } else {
        info!("burst decoder reading file: \"{}\"", &args.file);
        Ok(Box::new(io::BufReader::new(
            File::open(&args.file)
                .with_context(|| format!("Unable to open --file \"{}\"", args.file))?,
        )))
    }
}

// Next input byte, or None at end of input
//
// Read errors also end the input.
fn read_byte<R: io::Read + ?Sized>(input: &mut R) -> Option<u8> {
    match input.read_u8() {
        Ok(byte) => Some(byte),
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => None,
        Err(err) => {
            debug!("input read failed, treating as end of input: {}", err);
            None
        }
    }
}

fn output_setup(args: &Args) -> Result<Vec<Box<dyn AudioOut>>, anyhow::Error> {
    let mut outputs: Vec<Box<dyn AudioOut>> = Vec::new();

    if let Some(path) = &args.wav {
        info!("writing WAV file: \"{}\" at {} Hz", path, args.rate);
        let file = File::create(path)
            .with_context(|| format!("Unable to create --wav \"{}\"", path))?;
        let wav = WavFile::new(io::BufWriter::new(file), args.rate)
            .with_context(|| format!("Unable to write --wav \"{}\"", path))?;
        outputs.push(Box::new(wav));
    }

    match args.raw.as_deref() {
        Some(STDIO_FILE) => {
            info!("writing raw PCM to standard output");
            outputs.push(Box::new(RawPcm::new(io::BufWriter::new(io::stdout()))));
        }
        Some(path) => {
            info!("writing raw PCM file: \"{}\"", path);
            let file = File::create(path)
                .with_context(|| format!("Unable to create --raw \"{}\"", path))?;
            outputs.push(Box::new(RawPcm::new(io::BufWriter::new(file))));
        }
        None => {}
    }

    if outputs.is_empty() {
        info!("no --wav or --raw output: audio will be discarded");
    }

    Ok(outputs)
}

#[cfg(not(target_os = "windows"))]
fn is_terminal<S>(stream: &S) -> bool
where
    S: std::os::fd::AsRawFd,
{
    terminal_size::terminal_size_using_fd(stream.as_raw_fd()).is_some()
}

#[cfg(target_os = "windows")]
fn is_terminal<S>(stream: &S) -> bool
where
    S: std::os::windows::io::AsRawHandle,
{
    terminal_size::terminal_size_using_handle(stream.as_raw_handle()).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingReader;

    impl io::Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "device unplugged"))
        }
    }

    #[test]
    fn test_read_byte() {
        let mut input: &[u8] = &[7, 8];
        assert_eq!(read_byte(&mut input), Some(7));
        assert_eq!(read_byte(&mut input), Some(8));
        assert_eq!(read_byte(&mut input), None);

        assert_eq!(read_byte(&mut FailingReader), None);
    }
}
