//! Entity capability contract and the sandbox every entity call runs in.
//!
//! The engine never trusts entity code. Each call into an entity goes through
//! [`contain`], which turns both returned errors and panics into an
//! [`EntityFailure`] so one misbehaving entity cannot abort a batch.

use std::any::Any;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use save_codec::{ByteReader, ByteWriter, CodecRegistry};
use thiserror::Error;

/// Error type returned by entity implementations.
pub type EntityError = Box<dyn std::error::Error + Send + Sync>;

/// Shared handle to a registered entity.
pub type EntityHandle = Rc<RefCell<dyn Persistent>>;

pub(crate) type WeakHandle = Weak<RefCell<dyn Persistent>>;

/// An in-memory object whose state is persisted under a stable identity.
///
/// `serialize` and `restore` must write and read the same sequence of values
/// in the same order. The engine does not check this; a mismatch only
/// garbles this entity's own payload since every frame is length-prefixed.
pub trait Persistent {
    /// Caller-assigned identity, stable across runs and non-empty.
    fn identity(&self) -> &str;

    /// Writes the entity's state into `sink`.
    fn serialize(
        &self,
        sink: &mut ByteWriter<'_>,
        codecs: &CodecRegistry,
    ) -> Result<(), EntityError>;

    /// Restores state from `source`.
    ///
    /// `source` is `None` when the loaded file held no data for this
    /// identity; the entity should fall back to its defaults.
    fn restore(
        &mut self,
        source: Option<&mut ByteReader<'_>>,
        codecs: &CodecRegistry,
    ) -> Result<(), EntityError>;
}

/// A contained failure raised by entity code.
#[derive(Debug, Error)]
pub enum EntityFailure {
    #[error(transparent)]
    Failed(EntityError),

    #[error("entity panicked: {0}")]
    Panicked(String),

    #[error("entity is already borrowed")]
    Busy,

    #[error("payload of {len} bytes exceeds frame limit of {limit}")]
    Oversized { len: usize, limit: usize },
}

/// Runs entity code, catching both errors and panics.
pub(crate) fn contain<T>(op: impl FnOnce() -> Result<T, EntityError>) -> Result<T, EntityFailure> {
    match panic::catch_unwind(AssertUnwindSafe(op)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(error)) => Err(EntityFailure::Failed(error)),
        Err(payload) => Err(EntityFailure::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Reads the current identity of `handle`.
pub(crate) fn read_identity(handle: &EntityHandle) -> Result<String, EntityFailure> {
    let entity = handle.try_borrow().map_err(|_| EntityFailure::Busy)?;
    contain(|| Ok(entity.identity().to_owned()))
}

pub(crate) fn serialize_entity(
    handle: &EntityHandle,
    sink: &mut ByteWriter<'_>,
    codecs: &CodecRegistry,
) -> Result<(), EntityFailure> {
    let entity = handle.try_borrow().map_err(|_| EntityFailure::Busy)?;
    contain(|| entity.serialize(sink, codecs))
}

pub(crate) fn restore_entity(
    handle: &EntityHandle,
    source: Option<&mut ByteReader<'_>>,
    codecs: &CodecRegistry,
) -> Result<(), EntityFailure> {
    let mut entity = handle.try_borrow_mut().map_err(|_| EntityFailure::Busy)?;
    contain(|| entity.restore(source, codecs))
}

/// Address of the entity behind a handle, ignoring the vtable.
pub(crate) fn handle_addr(handle: &EntityHandle) -> *const () {
    Rc::as_ptr(handle) as *const ()
}

pub(crate) fn weak_addr(handle: &WeakHandle) -> *const () {
    Weak::as_ptr(handle) as *const ()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contain_maps_errors_and_panics() {
        let ok: Result<u8, _> = contain(|| Ok(7));
        assert_eq!(ok.unwrap(), 7);

        let failed = contain::<()>(|| Err("broken".into())).unwrap_err();
        assert_eq!(failed.to_string(), "broken");

        let panicked = contain::<()>(|| panic!("boom")).unwrap_err();
        assert!(matches!(panicked, EntityFailure::Panicked(ref m) if m == "boom"));

        let formatted = contain::<()>(|| panic!("code {}", 3)).unwrap_err();
        assert!(matches!(formatted, EntityFailure::Panicked(ref m) if m == "code 3"));
    }
}
