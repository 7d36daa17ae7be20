//! Fixed-length burst packetizer

use log::{debug, trace};

use crate::pdu::{Metadata, Pdu};

/// Metadata key: lifetime index of the burst
pub const KEY_BURST: &str = "burst";

/// Metadata key: packet length in bytes
pub const KEY_PACKET_LEN: &str = "packet_len";

/// Splits a synchronized byte stream into PDUs
///
/// Once the access code correlator has locked onto a
/// burst, the burst is read out as a fixed number of
/// bytes. The `Packetizer` converts each `packet_len`
/// bytes into one [`Pdu`]. Each PDU is annotated with
///
/// * `burst`: a monotonic burst counter, starting at zero
/// * `packet_len`: the configured packet length
///
/// ```
/// use burstrelay::{Packetizer, Value};
///
/// let mut pkt = Packetizer::new(4);
/// let pdus: Vec<_> = pkt.iter(0u8..10).collect();
///
/// assert_eq!(pdus.len(), 2);
/// assert_eq!(pdus[1].payload(), &[4, 5, 6, 7]);
/// assert_eq!(pdus[1].metadata().get("burst"), Some(&Value::Int(1)));
/// assert_eq!(pkt.discarded_bytes(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct Packetizer {
    packet_len: usize,
    bursts: u64,
    discarded_bytes: u64,
}

impl Packetizer {
    /// New packetizer for `packet_len`-byte bursts
    ///
    /// The packet length must be at least one byte.
    pub fn new(packet_len: usize) -> Self {
        Self {
            packet_len: usize::max(packet_len, 1),
            bursts: 0,
            discarded_bytes: 0,
        }
    }

    /// Packetize a source of bytes
    ///
    /// The iterator consumes as many bytes of `input` as
    /// are needed to form the next PDU. A partial packet
    /// at the end of the `input` is discarded.
    #[must_use = "iterators are lazy and do nothing unless consumed"]
    pub fn iter<'pkt, I, T>(&'pkt mut self, input: I) -> PacketIter<'pkt, T>
    where
        I: IntoIterator<Item = u8> + IntoIterator<IntoIter = T>,
        T: Iterator<Item = u8>,
    {
        PacketIter {
            source: input.into_iter(),
            packetizer: self,
        }
    }

    /// Packet length (bytes)
    pub fn packet_len(&self) -> usize {
        self.packet_len
    }

    /// Lifetime total of PDUs emitted
    pub fn bursts(&self) -> u64 {
        self.bursts
    }

    /// Lifetime total of bytes lost to partial packets
    pub fn discarded_bytes(&self) -> u64 {
        self.discarded_bytes
    }

    fn make_pdu(&mut self, payload: Vec<u8>) -> Pdu {
        let mut meta = Metadata::new();
        meta.insert(KEY_BURST, self.bursts as i64);
        meta.insert(KEY_PACKET_LEN, self.packet_len as i64);
        trace!("packetizer: burst {}", self.bursts);
        self.bursts += 1;
        Pdu::new(meta, payload)
    }
}

/// Iterator over PDUs from a byte source
///
/// See [`Packetizer::iter()`].
#[derive(Debug)]
pub struct PacketIter<'pkt, I>
where
    I: Iterator<Item = u8>,
{
    source: I,
    packetizer: &'pkt mut Packetizer,
}

impl<'pkt, I> Iterator for PacketIter<'pkt, I>
where
    I: Iterator<Item = u8>,
{
    type Item = Pdu;

    fn next(&mut self) -> Option<Self::Item> {
        let len = self.packetizer.packet_len;
        let payload: Vec<u8> = (&mut self.source).take(len).collect();
        if payload.len() == len {
            return Some(self.packetizer.make_pdu(payload));
        }

        if !payload.is_empty() {
            debug!(
                "packetizer: discarding {} trailing bytes of partial packet",
                payload.len()
            );
            self.packetizer.discarded_bytes += payload.len() as u64;
        }
        None
    }
}
