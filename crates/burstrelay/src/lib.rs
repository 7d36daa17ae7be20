//! # burstrelay: compressed burst PDU relay
//!
//! This crate carries compressed audio bursts from a packet
//! synchronizer to an audio sink. A burst receiver demodulates
//! a wireless link, correlates against an access code, and
//! reads out each burst as a fixed-length packet. Each packet
//! holds one zlib-compressed slice of a 16-bit PCM audio
//! stream.
//!
//! The receive chain, after synchronization, is:
//!
//! ```txt
//! bytes ─▶ Packetizer ─▶ DecompressPdu ─▶ StreamReassembler ─▶ PCM
//! ```
//!
//! Stages exchange [`Pdu`]s: a pairing of [`Metadata`] and a
//! byte payload. Stages which handle messages implement
//! [`MessageHandler`], and they publish to any
//! [`MessageSink`].
//!
//! ## Example
//!
//! ```
//! use std::io::Write;
//!
//! use burstrelay::{DecompressPduBuilder, MessageHandler, Packetizer, StreamReassembler};
//! use flate2::{write::ZlibEncoder, Compression};
//!
//! // one burst: two samples, compressed and padded to 32 bytes
//! let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
//! enc.write_all(&[0x00, 0x40, 0x00, 0xc0]).unwrap();
//! let mut burst = enc.finish().unwrap();
//! burst.resize(32, 0);
//!
//! let mut packetizer = Packetizer::new(32);
//! let relay = DecompressPduBuilder::new()
//!     .with_max_payload_len(4096)
//!     .build();
//! let mut audio = StreamReassembler::new();
//!
//! for pdu in packetizer.iter(burst) {
//!     relay.handle(pdu, &mut audio);
//! }
//! assert_eq!(audio.drain_i16(), vec![16384, -16384]);
//! ```
//!
//! ## Failure policy
//!
//! Bursts on a lossy link are routinely corrupted. The
//! [`DecompressPdu`] relay drops any PDU which does not
//! decompress, without publishing, logging, or reporting
//! an error. A corrupt burst simply leaves a gap in the
//! audio. Call [`DecompressPdu::transform()`] directly if
//! you need to know why.

mod builder;
mod packetizer;
mod pdu;
mod port;
mod reassembler;
mod relay;

pub use builder::DecompressPduBuilder;
pub use packetizer::{PacketIter, Packetizer, KEY_BURST, KEY_PACKET_LEN};
pub use pdu::{Metadata, Pdu, Value};
pub use port::{MessageHandler, MessageSink};
pub use reassembler::{StreamReassembler, PCM_SCALE};
pub use relay::{inflate, DecompressPdu, DecompressionError};
