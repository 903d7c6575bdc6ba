//! Cursor-based byte sink used by entity serializers.

use crate::error::{CodecError, Result};

/// Maximum encoded size of a `var_u32`.
pub const MAX_VAR_U32_LEN: usize = 5;

/// A byte sink that writes into caller-owned storage at an explicit cursor.
///
/// The cursor starts at zero regardless of what the storage already holds.
/// Storage is only grown when the cursor passes its current end and is never
/// shrunk, so a writer can reuse a large allocation left behind by an earlier
/// operation. [`position`](Self::position) is the logical length of what this
/// writer produced; bytes past it are stale and must not be read.
#[derive(Debug)]
pub struct ByteWriter<'a> {
    buf: &'a mut Vec<u8>,
    pos: usize,
}

impl<'a> ByteWriter<'a> {
    /// Creates a writer positioned at the start of `buf`.
    pub fn new(buf: &'a mut Vec<u8>) -> Self {
        Self { buf, pos: 0 }
    }

    /// Number of bytes written by this writer.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// The bytes written so far.
    #[must_use]
    pub fn written(&self) -> &[u8] {
        &self.buf[..self.pos]
    }

    /// Appends raw bytes with no length prefix.
    pub fn write_raw(&mut self, bytes: &[u8]) {
        let end = self.pos + bytes.len();
        if end > self.buf.len() {
            self.buf.resize(end, 0);
        }
        self.buf[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
    }

    pub fn write_u8(&mut self, value: u8) {
        self.write_raw(&[value]);
    }

    /// Writes a bool as a single `0`/`1` byte.
    pub fn write_bool(&mut self, value: bool) {
        self.write_u8(u8::from(value));
    }

    pub fn write_u16(&mut self, value: u16) {
        self.write_raw(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.write_raw(&value.to_le_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.write_raw(&value.to_le_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.write_raw(&value.to_le_bytes());
    }

    pub fn write_i64(&mut self, value: i64) {
        self.write_raw(&value.to_le_bytes());
    }

    pub fn write_f32(&mut self, value: f32) {
        self.write_raw(&value.to_le_bytes());
    }

    pub fn write_f64(&mut self, value: f64) {
        self.write_raw(&value.to_le_bytes());
    }

    /// Writes a `u32` in 7-bit groups, least significant group first.
    pub fn write_var_u32(&mut self, value: u32) {
        let mut scratch = [0u8; MAX_VAR_U32_LEN];
        let len = encode_var_u32(value, &mut scratch);
        self.write_raw(&scratch[..len]);
    }

    /// Writes a length-prefixed UTF-8 string.
    pub fn write_str(&mut self, value: &str) -> Result<()> {
        self.write_bytes(value.as_bytes())
    }

    /// Writes a `var_u32` length followed by the bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let len = u32::try_from(bytes.len())
            .map_err(|_| CodecError::LengthOverflow { len: bytes.len() })?;
        self.write_var_u32(len);
        self.write_raw(bytes);
        Ok(())
    }
}

/// Encodes `value` as a `var_u32` into `out`, returning the encoded length.
pub fn encode_var_u32(mut value: u32, out: &mut [u8; MAX_VAR_U32_LEN]) -> usize {
    let mut len = 0;
    loop {
        let group = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            out[len] = group;
            return len + 1;
        }
        out[len] = group | 0x80;
        len += 1;
    }
}
