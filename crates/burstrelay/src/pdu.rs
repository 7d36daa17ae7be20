//! Protocol data units

use std::fmt;
use std::sync::Arc;

/// A metadata value
///
/// Metadata values are a closed set of types. Relays carry
/// them through untouched and never need to inspect them.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Text
    Str(String),

    /// Signed integer
    Int(i64),

    /// Floating-point number
    Float(f64),

    /// Opaque bytes
    Blob(Vec<u8>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "\"{}\"", s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Blob(b) => write!(f, "blob[{}]", b.len()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Blob(b)
    }
}

/// PDU metadata
///
/// An ordered mapping from symbolic keys to [`Value`]s.
/// Iteration follows insertion order. Re-inserting an
/// existing key replaces its value but keeps its position.
///
/// ```
/// use burstrelay::{Metadata, Value};
///
/// let mut meta = Metadata::new();
/// meta.insert("burst", 7i64);
/// meta.insert("source", "hackrf");
/// meta.insert("burst", 8i64);
///
/// assert_eq!(meta.len(), 2);
/// assert_eq!(meta.get("burst"), Some(&Value::Int(8)));
/// let keys: Vec<&str> = meta.iter().map(|(k, _)| k).collect();
/// assert_eq!(keys, vec!["burst", "source"]);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Metadata {
    entries: Vec<(String, Value)>,
}

impl Metadata {
    /// Empty metadata
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace `key`
    ///
    /// Returns the previous value, if there was one.
    pub fn insert<K, V>(&mut self, key: K, value: V) -> Option<Value>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, old)) => Some(std::mem::replace(old, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Look up `key`
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K, V> FromIterator<(K, V)> for Metadata
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut out = Metadata::new();
        for (k, v) in iter {
            out.insert(k, v);
        }
        out
    }
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", k, v)?;
        }
        write!(f, "}}")
    }
}

/// A protocol data unit
///
/// A `Pdu` pairs [`Metadata`] with a byte payload. The two
/// halves always travel together. Metadata is held behind
/// an [`Arc`] so that a stage which only rewrites the
/// payload can hand the very same metadata to its output.
///
/// `Display` prints the PDU as a debugging sink would: the
/// metadata on one line, then a hex dump of the payload.
#[derive(Clone, Debug, PartialEq)]
pub struct Pdu {
    metadata: Arc<Metadata>,
    payload: Vec<u8>,
}

impl Pdu {
    /// New PDU from owned metadata and payload
    pub fn new(metadata: Metadata, payload: Vec<u8>) -> Self {
        Self::with_shared_metadata(Arc::new(metadata), payload)
    }

    /// New PDU which shares existing metadata
    pub fn with_shared_metadata(metadata: Arc<Metadata>, payload: Vec<u8>) -> Self {
        Self { metadata, payload }
    }

    /// Metadata
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Shared handle to the metadata
    pub fn shared_metadata(&self) -> &Arc<Metadata> {
        &self.metadata
    }

    /// Payload bytes
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Consume, returning metadata and payload
    pub fn into_parts(self) -> (Arc<Metadata>, Vec<u8>) {
        (self.metadata, self.payload)
    }
}

impl fmt::Display for Pdu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "pdu length = {:>5} bytes", self.payload.len())?;
        writeln!(f, "metadata = {}", self.metadata)?;
        for (row, chunk) in self.payload.chunks(16).enumerate() {
            write!(f, "{:04x}:", row * 16)?;
            for byte in chunk {
                write!(f, " {:02x}", byte)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_order() {
        let meta: Metadata = vec![("z", 1i64), ("a", 2i64), ("m", 3i64)]
            .into_iter()
            .collect();
        let keys: Vec<&str> = meta.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);

        let mut meta = meta;
        assert_eq!(meta.insert("a", "replaced"), Some(Value::Int(2)));
        let keys: Vec<&str> = meta.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
        assert_eq!(meta.get("a"), Some(&Value::Str("replaced".to_owned())));
        assert_eq!(meta.get("nope"), None);
    }

    #[test]
    fn test_into_parts_shares_metadata() {
        let mut meta = Metadata::new();
        meta.insert("burst", 3i64);
        let pdu = Pdu::new(meta, vec![1, 2, 3]);
        let handle = pdu.shared_metadata().clone();

        let (meta, payload) = pdu.into_parts();
        assert!(Arc::ptr_eq(&meta, &handle));
        assert_eq!(payload, vec![1, 2, 3]);
    }

    #[test]
    fn test_display() {
        let mut meta = Metadata::new();
        meta.insert("burst", 1i64);
        meta.insert("src", vec![0u8; 4]);
        let pdu = Pdu::new(meta, (0u8..18).collect());
        let txt = pdu.to_string();
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines[0], "pdu length =    18 bytes");
        assert_eq!(lines[1], "metadata = {burst: 1, src: blob[4]}");
        assert_eq!(
            lines[2],
            "0000: 00 01 02 03 04 05 06 07 08 09 0a 0b 0c 0d 0e 0f"
        );
        assert_eq!(lines[3], "0010: 10 11");
        assert_eq!(lines.len(), 4);
    }
}
