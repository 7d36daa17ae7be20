//! Compressed-payload message relay

use flate2::{Decompress, FlushDecompress, Status};
use thiserror::Error;

use crate::builder::DecompressPduBuilder;
use crate::pdu::Pdu;
use crate::port::{MessageHandler, MessageSink};

/// Error decompressing a PDU payload
#[derive(Error, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DecompressionError {
    /// Invalid header, invalid block data, or checksum mismatch
    #[error("malformed compressed payload: {0}")]
    Malformed(String),

    /// Input ended before the end-of-stream marker
    #[error("truncated compressed payload")]
    Truncated,

    /// Decompressed payload would exceed the configured limit
    #[error("decompressed payload exceeds {limit} bytes")]
    TooLarge {
        /// Maximum permitted payload length, in bytes
        limit: usize,
    },
}

impl From<flate2::DecompressError> for DecompressionError {
    fn from(err: flate2::DecompressError) -> Self {
        DecompressionError::Malformed(err.to_string())
    }
}

/// Decompress one zlib stream
///
/// Decompresses `data`, which must begin with a complete
/// zlib (RFC 1950) stream. The zlib header and Adler-32
/// trailer are validated. Any bytes which follow the end
/// of the stream are ignored, so fixed-length packets may
/// carry padding.
///
/// The output may not grow beyond `limit` bytes.
pub fn inflate(data: &[u8], limit: usize) -> Result<Vec<u8>, DecompressionError> {
    let mut zs = Decompress::new(true);
    let mut out = Vec::with_capacity(usize::min(
        data.len().saturating_mul(4).saturating_add(INFLATE_CHUNK_LEN),
        limit.saturating_add(1),
    ));

    loop {
        if out.len() == out.capacity() {
            out.reserve(usize::max(out.len(), INFLATE_CHUNK_LEN));
        }

        let in_before = zs.total_in();
        let out_before = zs.total_out();
        let status = zs.decompress_vec(
            &data[in_before as usize..],
            &mut out,
            FlushDecompress::None,
        )?;

        if out.len() > limit {
            return Err(DecompressionError::TooLarge { limit });
        }

        match status {
            Status::StreamEnd => return Ok(out),
            Status::Ok | Status::BufError => {
                // there was room for output, so no progress
                // means the input ran out
                if zs.total_in() == in_before && zs.total_out() == out_before {
                    return Err(DecompressionError::Truncated);
                }
            }
        }
    }
}

// output growth increment
const INFLATE_CHUNK_LEN: usize = 256;

/// Decompresses PDU payloads
///
/// The `DecompressPdu` relay sits between a packetizer and
/// a stream re-assembler. Each inbound [`Pdu`] is expected
/// to carry a zlib-compressed payload. The relay publishes
/// a new PDU with the *same* metadata (shared, not copied)
/// and the decompressed payload.
///
/// The relay operates on a lossy link where corrupt bursts
/// are routine. When used as a [`MessageHandler`], PDUs
/// which fail to decompress are discarded without a trace:
/// nothing is published, logged, or returned. Use
/// [`transform()`](DecompressPdu::transform) to see the
/// error.
///
/// ```
/// use std::io::Write;
///
/// use burstrelay::{DecompressPduBuilder, MessageHandler, Metadata, Pdu};
/// use flate2::{write::ZlibEncoder, Compression};
///
/// let relay = DecompressPduBuilder::new().build();
///
/// let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
/// enc.write_all(b"hello, burst").unwrap();
/// let compressed = enc.finish().unwrap();
///
/// let mut out: Vec<Pdu> = Vec::new();
/// relay.handle(Pdu::new(Metadata::new(), compressed), &mut out);
/// relay.handle(Pdu::new(Metadata::new(), b"garbage".to_vec()), &mut out);
///
/// assert_eq!(out.len(), 1);
/// assert_eq!(out[0].payload(), b"hello, burst");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecompressPdu {
    max_payload_len: usize,
}

impl DecompressPdu {
    /// Decompress the payload of `pdu`
    ///
    /// On success, returns a new PDU which shares the
    /// metadata of `pdu` and carries the decompressed
    /// payload. The input is consumed either way.
    pub fn transform(&self, pdu: Pdu) -> Result<Pdu, DecompressionError> {
        let (metadata, payload) = pdu.into_parts();
        let payload = inflate(&payload, self.max_payload_len)?;
        Ok(Pdu::with_shared_metadata(metadata, payload))
    }

    /// Maximum decompressed payload length, in bytes
    pub fn max_payload_len(&self) -> usize {
        self.max_payload_len
    }
}

impl MessageHandler for DecompressPdu {
    fn handle(&self, pdu: Pdu, out: &mut dyn MessageSink) {
        if let Ok(pdu) = self.transform(pdu) {
            out.publish(pdu);
        }
    }
}

impl From<&DecompressPduBuilder> for DecompressPdu {
    fn from(cfg: &DecompressPduBuilder) -> Self {
        Self {
            max_payload_len: cfg.max_payload_len(),
        }
    }
}

impl Default for DecompressPdu {
    fn default() -> Self {
        DecompressPduBuilder::default().build()
    }
}
