//! Surrogates: encode/decode pairs for value types the engine cannot interpret.

use std::any::{Any, TypeId};

use crate::error::{CodecError, Result};
use crate::{ByteReader, ByteWriter};

/// How a surrogate's values are framed inside an entity payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Always present; encoded bytes are written directly.
    Value,
    /// May be absent; encoded behind a one-byte presence flag.
    ///
    /// An absent value is written as `false` with no payload bytes and the
    /// surrogate is not invoked.
    Reference,
}

/// Type-specific encode/decode pair.
///
/// Implementations must read back exactly what they wrote; the registry adds
/// presence framing for [`ValueKind::Reference`] surrogates but performs no
/// other validation.
pub trait Surrogate: 'static {
    type Value: 'static;

    fn kind(&self) -> ValueKind {
        ValueKind::Value
    }

    /// Type predicate consulted when no surrogate is keyed under a type.
    ///
    /// Defaults to an exact match on [`Self::Value`].
    fn handles(&self, type_id: TypeId) -> bool {
        type_id == TypeId::of::<Self::Value>()
    }

    fn encode(&self, value: &Self::Value, sink: &mut ByteWriter<'_>) -> Result<()>;

    fn decode(&self, source: &mut ByteReader<'_>) -> Result<Self::Value>;
}

/// Object-safe view of a [`Surrogate`], as stored by the registry.
pub trait DynSurrogate {
    fn kind(&self) -> ValueKind;

    /// Name of the value type, for diagnostics.
    fn type_name(&self) -> &'static str;

    /// Type predicate: whether this surrogate handles values of `type_id`.
    fn handles(&self, type_id: TypeId) -> bool;

    fn encode_any(&self, value: &dyn Any, sink: &mut ByteWriter<'_>) -> Result<()>;

    fn decode_any(&self, source: &mut ByteReader<'_>) -> Result<Box<dyn Any>>;
}

impl<S: Surrogate> DynSurrogate for S {
    fn kind(&self) -> ValueKind {
        Surrogate::kind(self)
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<S::Value>()
    }

    fn handles(&self, type_id: TypeId) -> bool {
        Surrogate::handles(self, type_id)
    }

    fn encode_any(&self, value: &dyn Any, sink: &mut ByteWriter<'_>) -> Result<()> {
        let value = value
            .downcast_ref::<S::Value>()
            .ok_or(CodecError::TypeMismatch {
                expected: std::any::type_name::<S::Value>(),
            })?;
        self.encode(value, sink)
    }

    fn decode_any(&self, source: &mut ByteReader<'_>) -> Result<Box<dyn Any>> {
        Ok(Box::new(self.decode(source)?))
    }
}
