//! Surrogate for any serde type, backed by bincode.

use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{CodecError, Result};
use crate::surrogate::{Surrogate, ValueKind};
use crate::{ByteReader, ByteWriter};

/// Encodes `T` with bincode behind a `var_u32` length prefix.
///
/// The length prefix keeps a decode from consuming bytes that belong to the
/// next value even when bincode's own framing disagrees with the writer.
pub struct BincodeSurrogate<T> {
    kind: ValueKind,
    _marker: PhantomData<fn() -> T>,
}

impl<T> BincodeSurrogate<T> {
    /// Surrogate for an always-present value.
    pub fn new() -> Self {
        Self {
            kind: ValueKind::Value,
            _marker: PhantomData,
        }
    }

    /// Surrogate for a value that may be absent.
    pub fn reference() -> Self {
        Self {
            kind: ValueKind::Reference,
            _marker: PhantomData,
        }
    }
}

impl<T> Default for BincodeSurrogate<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Surrogate for BincodeSurrogate<T>
where
    T: Serialize + DeserializeOwned + 'static,
{
    type Value = T;

    fn kind(&self) -> ValueKind {
        self.kind
    }

    fn encode(&self, value: &T, sink: &mut ByteWriter<'_>) -> Result<()> {
        let bytes =
            bincode::serialize(value).map_err(|e| CodecError::Serialization(e.to_string()))?;
        sink.write_bytes(&bytes)
    }

    fn decode(&self, source: &mut ByteReader<'_>) -> Result<T> {
        let bytes = source.read_bytes()?;
        bincode::deserialize(bytes).map_err(|e| CodecError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::CodecRegistry;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Inventory {
        slots: Vec<u32>,
        owner: String,
    }

    #[test]
    fn serde_values_round_trip_through_registry() {
        let mut registry = CodecRegistry::new();
        registry.register(BincodeSurrogate::<Inventory>::reference());

        let inventory = Inventory {
            slots: vec![3, 1, 4],
            owner: "A".to_string(),
        };

        let mut buf = Vec::new();
        let mut sink = ByteWriter::new(&mut buf);
        registry.encode(Some(&inventory), &mut sink).unwrap();
        registry.encode::<Inventory>(None, &mut sink).unwrap();
        let len = sink.position();

        let mut source = ByteReader::new(&buf[..len]);
        assert_eq!(
            registry.decode::<Inventory>(&mut source).unwrap(),
            Some(inventory)
        );
        assert_eq!(registry.decode::<Inventory>(&mut source).unwrap(), None);
    }

    #[test]
    fn truncated_payload_is_reported() {
        let surrogate = BincodeSurrogate::<u64>::new();
        let mut source = ByteReader::new(&[8, 1, 2]);
        assert!(matches!(
            surrogate.decode(&mut source),
            Err(CodecError::UnexpectedEof { .. })
        ));
    }
}
