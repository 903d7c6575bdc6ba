//! Registry mapping value types to their surrogates.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::error::{CodecError, Result};
use crate::surrogate::{DynSurrogate, Surrogate, ValueKind};
use crate::{ByteReader, ByteWriter};

/// Maps a value type to the surrogate that encodes it.
///
/// At most one surrogate is keyed per type; registering again replaces the
/// previous one. A type with no keyed surrogate falls back to the first
/// surrogate, in registration order, whose type predicate accepts it. Encoding a type with no surrogate is an error rather than a
/// silent skip, since skipping would shift every later value in the payload.
#[derive(Default)]
pub struct CodecRegistry {
    surrogates: HashMap<TypeId, Box<dyn DynSurrogate>>,
    order: Vec<TypeId>,
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `surrogate` for its value type.
    ///
    /// Returns `true` if a previously registered surrogate was replaced.
    pub fn register<S: Surrogate>(&mut self, surrogate: S) -> bool {
        let type_name = std::any::type_name::<S::Value>();
        let type_id = TypeId::of::<S::Value>();
        let replaced = self
            .surrogates
            .insert(type_id, Box::new(surrogate))
            .is_some();
        if !replaced {
            self.order.push(type_id);
        }

        debug!(
            target: "save_codec::registry",
            type_name,
            replaced,
            "Registered surrogate"
        );

        replaced
    }

    /// Removes the surrogate for `T`, returning whether one was registered.
    pub fn unregister<T: 'static>(&mut self) -> bool {
        let type_id = TypeId::of::<T>();
        self.order.retain(|id| *id != type_id);
        self.surrogates.remove(&type_id).is_some()
    }

    pub fn is_registered<T: 'static>(&self) -> bool {
        self.resolve(TypeId::of::<T>()).is_some()
    }

    /// Looks up the surrogate handling `type_id`: the one keyed under it,
    /// otherwise the earliest registered one whose predicate accepts it.
    pub fn resolve(&self, type_id: TypeId) -> Option<&dyn DynSurrogate> {
        if let Some(surrogate) = self.surrogates.get(&type_id) {
            return Some(surrogate.as_ref());
        }
        self.order
            .iter()
            .filter_map(|id| self.surrogates.get(id))
            .map(|s| s.as_ref())
            .find(|s| s.handles(type_id))
    }

    fn resolve_for<T: 'static>(&self) -> Result<&dyn DynSurrogate> {
        self.resolve(TypeId::of::<T>())
            .ok_or(CodecError::UnregisteredType {
                type_name: std::any::type_name::<T>(),
            })
    }

    /// Encodes an optional value using the surrogate registered for `T`.
    ///
    /// Reference kinds get a presence flag; `None` writes `false` and stops.
    /// Value kinds are written directly and cannot be absent.
    pub fn encode<T: 'static>(&self, value: Option<&T>, sink: &mut ByteWriter<'_>) -> Result<()> {
        let surrogate = self.resolve_for::<T>()?;

        match (surrogate.kind(), value) {
            (ValueKind::Value, Some(value)) => surrogate.encode_any(value, sink),
            (ValueKind::Value, None) => Err(CodecError::AbsentValueKind {
                type_name: surrogate.type_name(),
            }),
            (ValueKind::Reference, None) => {
                sink.write_bool(false);
                Ok(())
            }
            (ValueKind::Reference, Some(value)) => {
                sink.write_bool(true);
                surrogate.encode_any(value, sink)
            }
        }
    }

    /// Decodes a value written by [`encode`](Self::encode).
    ///
    /// Returns `None` for an absent reference without invoking the surrogate.
    pub fn decode<T: 'static>(&self, source: &mut ByteReader<'_>) -> Result<Option<T>> {
        let surrogate = self.resolve_for::<T>()?;

        if surrogate.kind() == ValueKind::Reference && !source.read_bool()? {
            return Ok(None);
        }

        let value = surrogate
            .decode_any(source)?
            .downcast::<T>()
            .map_err(|_| CodecError::TypeMismatch {
                expected: std::any::type_name::<T>(),
            })?;

        Ok(Some(*value))
    }

    pub fn encode_value<T: 'static>(&self, value: &T, sink: &mut ByteWriter<'_>) -> Result<()> {
        self.encode(Some(value), sink)
    }

    /// Decodes a value that must be present.
    pub fn decode_value<T: 'static>(&self, source: &mut ByteReader<'_>) -> Result<T> {
        self.decode(source)?.ok_or(CodecError::MissingValue {
            type_name: std::any::type_name::<T>(),
        })
    }

    pub fn len(&self) -> usize {
        self.surrogates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surrogates.is_empty()
    }

    pub fn clear(&mut self) {
        self.surrogates.clear();
        self.order.clear();
    }

    /// Names of all registered value types, sorted.
    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.surrogates.values().map(|s| s.type_name()).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("types", &self.type_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Vec2 {
        x: f32,
        y: f32,
    }

    struct Vec2Surrogate;

    impl Surrogate for Vec2Surrogate {
        type Value = Vec2;

        fn encode(&self, value: &Vec2, sink: &mut ByteWriter<'_>) -> Result<()> {
            sink.write_f32(value.x);
            sink.write_f32(value.y);
            Ok(())
        }

        fn decode(&self, source: &mut ByteReader<'_>) -> Result<Vec2> {
            Ok(Vec2 {
                x: source.read_f32()?,
                y: source.read_f32()?,
            })
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Tag(String);

    /// Reference-kind surrogate that counts invocations.
    #[derive(Default)]
    struct TagSurrogate {
        calls: std::rc::Rc<std::cell::Cell<usize>>,
    }

    impl Surrogate for TagSurrogate {
        type Value = Tag;

        fn kind(&self) -> ValueKind {
            ValueKind::Reference
        }

        fn encode(&self, value: &Tag, sink: &mut ByteWriter<'_>) -> Result<()> {
            self.calls.set(self.calls.get() + 1);
            sink.write_str(&value.0)
        }

        fn decode(&self, source: &mut ByteReader<'_>) -> Result<Tag> {
            self.calls.set(self.calls.get() + 1);
            Ok(Tag(source.read_str()?.to_owned()))
        }
    }

    #[test]
    fn value_kind_is_written_directly() {
        let mut registry = CodecRegistry::new();
        registry.register(Vec2Surrogate);

        let mut buf = Vec::new();
        let mut sink = ByteWriter::new(&mut buf);
        registry
            .encode_value(&Vec2 { x: 1.0, y: -2.0 }, &mut sink)
            .unwrap();
        assert_eq!(sink.position(), 8);

        let len = sink.position();
        let mut source = ByteReader::new(&buf[..len]);
        let decoded: Vec2 = registry.decode_value(&mut source).unwrap();
        assert_eq!(decoded, Vec2 { x: 1.0, y: -2.0 });
    }

    #[test]
    fn absent_reference_writes_flag_only_and_skips_surrogate() {
        let calls = std::rc::Rc::new(std::cell::Cell::new(0));
        let mut registry = CodecRegistry::new();
        registry.register(TagSurrogate {
            calls: calls.clone(),
        });

        let mut buf = Vec::new();
        let mut sink = ByteWriter::new(&mut buf);
        registry.encode::<Tag>(None, &mut sink).unwrap();
        registry
            .encode(Some(&Tag("hero".into())), &mut sink)
            .unwrap();
        let len = sink.position();
        assert_eq!(&buf[..2], &[0, 1]);
        assert_eq!(calls.get(), 1);

        let mut source = ByteReader::new(&buf[..len]);
        assert_eq!(registry.decode::<Tag>(&mut source).unwrap(), None);
        assert_eq!(
            registry.decode::<Tag>(&mut source).unwrap(),
            Some(Tag("hero".into()))
        );
        assert_eq!(calls.get(), 2);
        assert_eq!(source.remaining(), 0);
    }

    #[test]
    fn unregistered_type_is_an_error() {
        let registry = CodecRegistry::new();
        let mut buf = Vec::new();
        let mut sink = ByteWriter::new(&mut buf);
        let err = registry
            .encode_value(&Vec2 { x: 0.0, y: 0.0 }, &mut sink)
            .unwrap_err();
        assert!(matches!(err, CodecError::UnregisteredType { .. }));
        assert_eq!(sink.position(), 0);
    }

    #[test]
    fn value_kind_cannot_be_absent() {
        let mut registry = CodecRegistry::new();
        registry.register(Vec2Surrogate);
        let mut buf = Vec::new();
        let mut sink = ByteWriter::new(&mut buf);
        assert!(matches!(
            registry.encode::<Vec2>(None, &mut sink),
            Err(CodecError::AbsentValueKind { .. })
        ));
    }

    #[test]
    fn absent_reference_fails_decode_value() {
        let mut registry = CodecRegistry::new();
        registry.register(TagSurrogate::default());
        let mut source = ByteReader::new(&[0]);
        assert!(matches!(
            registry.decode_value::<Tag>(&mut source),
            Err(CodecError::MissingValue { .. })
        ));
    }

    #[test]
    fn reregistration_overwrites() {
        let mut registry = CodecRegistry::new();
        assert!(!registry.register(Vec2Surrogate));
        assert!(registry.register(Vec2Surrogate));
        assert_eq!(registry.len(), 1);
        assert!(registry.is_registered::<Vec2>());
        assert!(!registry.is_registered::<Tag>());

        assert!(registry.unregister::<Vec2>());
        assert!(registry.is_empty());
    }

    /// Accepts any `u16` as well as its own `u32` values.
    struct WideningSurrogate;

    impl Surrogate for WideningSurrogate {
        type Value = u32;

        fn handles(&self, type_id: TypeId) -> bool {
            type_id == TypeId::of::<u32>() || type_id == TypeId::of::<u16>()
        }

        fn encode(&self, value: &u32, sink: &mut ByteWriter<'_>) -> Result<()> {
            sink.write_u32(*value);
            Ok(())
        }

        fn decode(&self, source: &mut ByteReader<'_>) -> Result<u32> {
            source.read_u32()
        }
    }

    struct NarrowSurrogate;

    impl Surrogate for NarrowSurrogate {
        type Value = u16;

        fn encode(&self, value: &u16, sink: &mut ByteWriter<'_>) -> Result<()> {
            sink.write_u16(*value);
            Ok(())
        }

        fn decode(&self, source: &mut ByteReader<'_>) -> Result<u16> {
            source.read_u16()
        }
    }

    #[test]
    fn test_predicate_resolves_unkeyed_type() {
        let mut registry = CodecRegistry::new();
        registry.register(Vec2Surrogate);
        registry.register(WideningSurrogate);

        let surrogate = registry.resolve(TypeId::of::<u16>()).unwrap();
        assert_eq!(surrogate.type_name(), std::any::type_name::<u32>());
        assert!(registry.is_registered::<u16>());
        assert!(!registry.is_registered::<u8>());

        registry.register(NarrowSurrogate);
        let surrogate = registry.resolve(TypeId::of::<u16>()).unwrap();
        assert_eq!(surrogate.type_name(), std::any::type_name::<u16>());

        registry.unregister::<u16>();
        registry.unregister::<u32>();
        assert!(!registry.is_registered::<u16>());
        assert!(registry.is_registered::<Vec2>());
    }
}
