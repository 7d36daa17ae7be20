//! Receive chain driver
//!
//! Bytes from the access code correlator flow through
//!
//! ```txt
//!   input ─▶ Packetizer ─┬─▶ DecompressPdu ─▶ StreamReassembler ─▶ AudioOut
//!                        │
//!                        └─▶ PDU log (--print-pdus)
//! ```
//!
//! Audio is written to the outputs after every packet so
//! that live listeners hear it with one packet of latency.

use std::io::Write;

use anyhow::Context;
use log::{debug, info};

use burstrelay::{
    DecompressPduBuilder, MessageHandler, MessageSink, Packetizer, Pdu,
    StreamReassembler,
};

use crate::audio::AudioOut;

/// Configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub packet_len: usize,
    pub max_payload_len: usize,
    pub print_pdus: bool,
}

/// Totals for one run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    /// Packets formed from the input
    pub bursts_in: u64,

    /// Packets which decompressed successfully
    pub bursts_relayed: u64,

    /// Trailing bytes which did not fill a packet
    pub discarded_bytes: u64,

    /// Audio samples written
    pub samples_out: u64,
}

impl Summary {
    /// Packets which failed to decompress
    pub fn bursts_dropped(&self) -> u64 {
        self.bursts_in - self.bursts_relayed
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} bursts received, {} relayed, {} dropped; {} trailing bytes discarded; {} samples written",
            self.bursts_in,
            self.bursts_relayed,
            self.bursts_dropped(),
            self.discarded_bytes,
            self.samples_out
        )
    }
}

/// Run the receive chain
///
/// Consumes every byte from `input`, writing recovered
/// audio to `output`. The `output` is finished before
/// returning. If `config.print_pdus` is set, every packet
/// is printed to `pdu_log` before it is relayed.
///
/// Fails only if an output cannot be written.
pub fn run<I, O, L>(
    config: &Config,
    input: I,
    output: &mut O,
    pdu_log: &mut L,
) -> anyhow::Result<Summary>
where
    I: Iterator<Item = u8>,
    O: AudioOut + ?Sized,
    L: Write + ?Sized,
{
    let mut packetizer = Packetizer::new(config.packet_len);
    let relay = DecompressPduBuilder::new()
        .with_max_payload_len(config.max_payload_len)
        .build();
    let mut audio = CountingSink::new(StreamReassembler::new());

    for pdu in packetizer.iter(input) {
        if config.print_pdus {
            writeln!(pdu_log, "{}", pdu).context("unable to print PDU")?;
        }

        relay.handle(pdu, &mut audio);

        let samples = audio.inner.drain_i16();
        if !samples.is_empty() {
            output
                .write_samples(&samples)
                .context("unable to write audio output")?;
        }
    }

    if audio.inner.pending_bytes() > 0 {
        debug!("input ended in the middle of an audio sample");
    }
    output.finish().context("unable to finish audio output")?;

    let summary = Summary {
        bursts_in: packetizer.bursts(),
        bursts_relayed: audio.published,
        discarded_bytes: packetizer.discarded_bytes(),
        samples_out: audio.inner.samples_out(),
    };
    info!("{}", summary);
    Ok(summary)
}

// Forwards messages, counting them
//
// The relay keeps no counters of its own. Drops are
// measured here, outside it.
#[derive(Debug)]
struct CountingSink<S> {
    inner: S,
    published: u64,
}

impl<S> CountingSink<S> {
    fn new(inner: S) -> Self {
        Self {
            inner,
            published: 0,
        }
    }
}

impl<S: MessageSink> MessageSink for CountingSink<S> {
    fn publish(&mut self, pdu: Pdu) {
        self.published += 1;
        self.inner.publish(pdu);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use flate2::{write::ZlibEncoder, Compression};

    use crate::audio::RawPcm;

    fn burst(samples: &[i16], packet_len: usize) -> Vec<u8> {
        let mut pcm = Vec::new();
        for sa in samples {
            pcm.extend_from_slice(&sa.to_le_bytes());
        }
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::best());
        enc.write_all(&pcm).unwrap();
        let mut out = enc.finish().unwrap();
        assert!(out.len() <= packet_len);
        out.resize(packet_len, 0);
        out
    }

    fn config() -> Config {
        Config {
            packet_len: 128,
            max_payload_len: 1 << 20,
            print_pdus: false,
        }
    }

    #[test]
    fn test_run() {
        let tone: Vec<i16> = (0..200).map(|i| ((i % 20) * 1000 - 10000) as i16).collect();
        let silence = vec![0i16; 300];

        let mut input = Vec::new();
        input.extend(burst(&tone, 128));
        input.extend(vec![0xa5u8; 128]); // corrupt burst
        input.extend(burst(&silence, 128));
        input.extend(vec![0u8; 10]); // partial packet

        let mut out = RawPcm::new(Vec::new());
        let mut log = Vec::new();
        let summary = run(&config(), input.into_iter(), &mut out, &mut log).unwrap();

        assert_eq!(
            summary,
            Summary {
                bursts_in: 3,
                bursts_relayed: 2,
                discarded_bytes: 10,
                samples_out: 500,
            }
        );
        assert_eq!(summary.bursts_dropped(), 1);
        assert!(log.is_empty());
        assert_eq!(
            summary.to_string(),
            "3 bursts received, 2 relayed, 1 dropped; 10 trailing bytes discarded; 500 samples written"
        );

        let bytes = out.into_inner();
        assert_eq!(bytes.len(), 1000);
        assert_eq!(&bytes[0..2], &(-10000i16).to_le_bytes());
        assert!(bytes[400..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_run_empty() {
        let mut out = RawPcm::new(Vec::new());
        let summary = run(&config(), std::iter::empty(), &mut out, &mut std::io::sink()).unwrap();
        assert_eq!(summary, Summary::default());
        assert!(out.into_inner().is_empty());
    }

    #[test]
    fn test_print_pdus() {
        let mut cfg = config();
        cfg.packet_len = 16;
        cfg.print_pdus = true;

        // two packets: one corrupt, one not compressed at all
        let input: Vec<u8> = (0u8..32).collect();
        let mut out = RawPcm::new(Vec::new());
        let mut log = Vec::new();
        let summary = run(&cfg, input.into_iter(), &mut out, &mut log).unwrap();
        assert_eq!(summary.bursts_in, 2);
        assert_eq!(summary.bursts_relayed, 0);

        // corrupt packets are still printed
        let log = String::from_utf8(log).unwrap();
        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(
            lines,
            vec![
                "pdu length =    16 bytes",
                "metadata = {burst: 0, packet_len: 16}",
                "0000: 00 01 02 03 04 05 06 07 08 09 0a 0b 0c 0d 0e 0f",
                "",
                "pdu length =    16 bytes",
                "metadata = {burst: 1, packet_len: 16}",
                "0000: 10 11 12 13 14 15 16 17 18 19 1a 1b 1c 1d 1e 1f",
                "",
            ]
        );
    }
}
