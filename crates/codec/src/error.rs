//! Error types raised while encoding or decoding payload values.

use thiserror::Error;

/// Errors surfaced by byte primitives and the codec registry.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("unexpected end of payload: requested {requested} bytes, {available} available")]
    UnexpectedEof { requested: usize, available: usize },

    #[error("no surrogate registered for type `{type_name}`")]
    UnregisteredType { type_name: &'static str },

    #[error("value of type `{type_name}` was encoded as absent")]
    MissingValue { type_name: &'static str },

    #[error("type `{type_name}` is a value kind and cannot be encoded as absent")]
    AbsentValueKind { type_name: &'static str },

    #[error("surrogate for `{expected}` received a value of a different type")]
    TypeMismatch { expected: &'static str },

    #[error("string payload is not valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("variable-length integer exceeds 32 bits")]
    VarintOverflow,

    #[error("length {len} does not fit the wire format")]
    LengthOverflow { len: usize },

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, CodecError>;
