//! PDU to PCM stream re-assembly

use crate::pdu::Pdu;
use crate::port::MessageSink;

/// Full-scale for conversion from `i16` to `f32`
pub const PCM_SCALE: f32 = 1.0f32 / 32767.0f32;

/// Re-assembles PDUs into a PCM sample stream
///
/// Each relayed PDU carries a slice of a continuous audio
/// stream, encoded as signed 16-bit little-endian PCM. The
/// re-assembler concatenates payloads in the order they are
/// published and converts them back into samples. A sample
/// may straddle two PDUs: an odd trailing byte is held
/// until the next PDU arrives.
///
/// Metadata is not used.
///
/// ```
/// use burstrelay::{MessageSink, Metadata, Pdu, StreamReassembler};
///
/// let mut rsm = StreamReassembler::new();
/// rsm.publish(Pdu::new(Metadata::new(), vec![0x01, 0x00, 0xff]));
/// rsm.publish(Pdu::new(Metadata::new(), vec![0x7f]));
/// assert_eq!(rsm.drain_i16(), vec![1, 32767]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct StreamReassembler {
    samples: Vec<i16>,
    carry: Option<u8>,
    samples_out: u64,
}

impl StreamReassembler {
    /// New, empty re-assembler
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all complete samples
    pub fn drain_i16(&mut self) -> Vec<i16> {
        self.samples_out += self.samples.len() as u64;
        std::mem::take(&mut self.samples)
    }

    /// Take all complete samples as `f32`
    ///
    /// Samples are scaled by [`PCM_SCALE`], so full-scale
    /// input is approximately `±1.0`.
    pub fn drain_f32(&mut self) -> Vec<f32> {
        self.drain_i16()
            .into_iter()
            .map(|sa| sa as f32 * PCM_SCALE)
            .collect()
    }

    /// Bytes held waiting for the rest of their sample
    pub fn pending_bytes(&self) -> usize {
        self.carry.is_some() as usize
    }

    /// Lifetime total of samples drained
    pub fn samples_out(&self) -> u64 {
        self.samples_out
    }

    /// Discard all buffered samples and bytes
    pub fn reset(&mut self) {
        self.samples.clear();
        self.carry = None;
    }

    fn push_bytes(&mut self, mut bytes: &[u8]) {
        if let (Some(lo), Some((&hi, rest))) = (self.carry, bytes.split_first()) {
            self.samples.push(i16::from_le_bytes([lo, hi]));
            self.carry = None;
            bytes = rest;
        }

        let mut pairs = bytes.chunks_exact(2);
        self.samples
            .extend((&mut pairs).map(|p| i16::from_le_bytes([p[0], p[1]])));
        if let [odd] = pairs.remainder() {
            self.carry = Some(*odd);
        }
    }
}

impl MessageSink for StreamReassembler {
    fn publish(&mut self, pdu: Pdu) {
        self.push_bytes(pdu.payload());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_approx_eq::assert_approx_eq;

    use crate::pdu::Metadata;

    fn pdu(bytes: &[u8]) -> Pdu {
        Pdu::new(Metadata::new(), bytes.to_vec())
    }

    #[test]
    fn test_reassemble() {
        let mut rsm = StreamReassembler::new();
        rsm.publish(pdu(&[0x00, 0x80, 0xff]));
        assert_eq!(rsm.pending_bytes(), 1);
        rsm.publish(pdu(&[]));
        assert_eq!(rsm.pending_bytes(), 1);
        rsm.publish(pdu(&[0xff, 0x34, 0x12]));
        assert_eq!(rsm.pending_bytes(), 0);

        assert_eq!(rsm.drain_i16(), vec![i16::MIN, -1, 0x1234]);
        assert!(rsm.drain_i16().is_empty());
        assert_eq!(rsm.samples_out(), 3);

        rsm.publish(pdu(&[0x01]));
        rsm.reset();
        rsm.publish(pdu(&[0x02, 0x00]));
        assert_eq!(rsm.drain_i16(), vec![2]);
    }

    #[test]
    fn test_float_scale() {
        let mut rsm = StreamReassembler::new();
        let mut bytes = Vec::new();
        for sa in [i16::MAX, 0, -16384, i16::MIN] {
            bytes.extend_from_slice(&sa.to_le_bytes());
        }
        rsm.publish(pdu(&bytes));

        let out = rsm.drain_f32();
        assert_eq!(out.len(), 4);
        assert_approx_eq!(out[0], 1.0f32);
        assert_approx_eq!(out[1], 0.0f32);
        assert_approx_eq!(out[2], -0.5f32, 1.0e-4);
        assert_approx_eq!(out[3], -1.0f32, 1.0e-4);
    }
}
