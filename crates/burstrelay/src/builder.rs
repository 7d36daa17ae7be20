use crate::relay::DecompressPdu;

/// Builds a decompressing PDU relay
///
/// The builder comes with sensible defaults. The API
/// specified by the builder is part of this crate's API.
/// The actual default values are *not*, however, and are
/// subject to revision in any minor release.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecompressPduBuilder {
    max_payload_len: usize,
}

impl DecompressPduBuilder {
    /// New relay configuration with sensible defaults
    pub fn new() -> Self {
        Self {
            max_payload_len: 1 << 20,
        }
    }

    /// Build the relay
    ///
    /// Once built, the relay is immediately ready to
    /// handle messages.
    pub fn build(&self) -> DecompressPdu {
        DecompressPdu::from(self)
    }

    /// Maximum decompressed payload length (bytes)
    ///
    /// A small corrupt or hostile burst can expand to an
    /// enormous payload. Payloads which would decompress to
    /// more than `len` bytes are treated like any other
    /// decompression failure and dropped.
    ///
    /// The length is clamped to at least one byte. An empty
    /// payload is always permitted.
    pub fn with_max_payload_len(&mut self, len: usize) -> &mut Self {
        self.max_payload_len = usize::max(len, 1);
        self
    }

    /// Maximum decompressed payload length (bytes)
    pub fn max_payload_len(&self) -> usize {
        self.max_payload_len
    }
}

impl std::default::Default for DecompressPduBuilder {
    fn default() -> Self {
        Self::new()
    }
}
