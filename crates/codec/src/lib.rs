//! Payload encoding primitives shared by save entities.
//!
//! Entities write their state through a [`ByteWriter`] and read it back through
//! a [`ByteReader`]. Values the entity cannot encode by hand go through the
//! [`CodecRegistry`], which maps a type to its [`Surrogate`].
//!
//! - [`writer`] and [`reader`] hold the little-endian byte primitives
//! - [`surrogate`] defines the encode/decode contract and value kinds
//! - [`registry`] resolves surrogates and applies presence framing
mod bincode_surrogate;
mod error;
pub mod reader;
pub mod registry;
pub mod surrogate;
pub mod writer;

pub use bincode_surrogate::BincodeSurrogate;
pub use error::{CodecError, Result};
pub use reader::{ByteReader, VarU32Decoder};
pub use registry::CodecRegistry;
pub use surrogate::{DynSurrogate, Surrogate, ValueKind};
pub use writer::{ByteWriter, MAX_VAR_U32_LEN, encode_var_u32};
