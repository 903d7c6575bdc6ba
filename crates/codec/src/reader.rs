//! Bounds-checked byte source used by entity restorers.

use crate::error::{CodecError, Result};

/// A byte source over a borrowed payload.
///
/// Every read is bounds-checked against the slice and fails with
/// [`CodecError::UnexpectedEof`] instead of reading past it. The reader never
/// panics on malformed input.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Total length of the payload this reader is scoped to.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Reads exactly `len` bytes.
    pub fn read_raw(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(CodecError::UnexpectedEof {
                requested: len,
                available: self.remaining(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_raw(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Reads a bool; any non-zero byte is `true`.
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_array().map(u16::from_le_bytes)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.read_array().map(u64::from_le_bytes)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.read_array().map(i32::from_le_bytes)
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.read_array().map(i64::from_le_bytes)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.read_array().map(f32::from_le_bytes)
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.read_array().map(f64::from_le_bytes)
    }

    /// Reads a `u32` written by [`ByteWriter::write_var_u32`](crate::ByteWriter::write_var_u32).
    pub fn read_var_u32(&mut self) -> Result<u32> {
        let mut decoder = VarU32Decoder::default();
        loop {
            if let Some(value) = decoder.push(self.read_u8()?)? {
                return Ok(value);
            }
        }
    }

    /// Reads a length-prefixed byte string.
    pub fn read_bytes(&mut self) -> Result<&'a [u8]> {
        let len = self.read_var_u32()? as usize;
        self.read_raw(len)
    }

    /// Reads a length-prefixed UTF-8 string.
    pub fn read_str(&mut self) -> Result<&'a str> {
        let bytes = self.read_bytes()?;
        Ok(std::str::from_utf8(bytes)?)
    }
}

/// Incremental `var_u32` decoder, fed one byte at a time.
///
/// Shared by [`ByteReader`] and stream readers that cannot borrow a slice.
#[derive(Debug, Default)]
pub struct VarU32Decoder {
    value: u32,
    shift: u32,
}

impl VarU32Decoder {
    /// Feeds one byte; returns the value once the final group arrives.
    pub fn push(&mut self, byte: u8) -> Result<Option<u32>> {
        let group = u32::from(byte & 0x7F);
        // Fifth group may only carry the top 4 bits.
        if self.shift == 28 && group > 0x0F {
            return Err(CodecError::VarintOverflow);
        }
        self.value |= group << self.shift;
        if byte & 0x80 == 0 {
            return Ok(Some(self.value));
        }
        self.shift += 7;
        if self.shift > 28 {
            return Err(CodecError::VarintOverflow);
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ByteWriter;

    #[test]
    fn reads_back_primitives() {
        let mut buf = Vec::new();
        let mut writer = ByteWriter::new(&mut buf);
        writer.write_i32(-7);
        writer.write_bool(true);
        writer.write_f64(1.5);
        writer.write_str("gold").unwrap();
        let len = writer.position();

        let mut reader = ByteReader::new(&buf[..len]);
        assert_eq!(reader.read_i32().unwrap(), -7);
        assert!(reader.read_bool().unwrap());
        assert_eq!(reader.read_f64().unwrap(), 1.5);
        assert_eq!(reader.read_str().unwrap(), "gold");
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn over_read_is_an_error() {
        let mut reader = ByteReader::new(&[1, 2]);
        let err = reader.read_u32().unwrap_err();
        assert!(matches!(
            err,
            CodecError::UnexpectedEof {
                requested: 4,
                available: 2
            }
        ));
        // Failed reads do not move the cursor.
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn oversized_varint_is_rejected() {
        let mut reader = ByteReader::new(&[0xFF, 0xFF, 0xFF, 0xFF, 0x7F]);
        assert!(matches!(
            reader.read_var_u32(),
            Err(CodecError::VarintOverflow)
        ));

        let mut reader = ByteReader::new(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x01]);
        assert!(matches!(
            reader.read_var_u32(),
            Err(CodecError::VarintOverflow)
        ));
    }

    #[test]
    fn max_varint_round_trips() {
        let mut reader = ByteReader::new(&[0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
        assert_eq!(reader.read_var_u32().unwrap(), u32::MAX);
    }

    #[test]
    fn invalid_utf8_is_reported() {
        let mut reader = ByteReader::new(&[2, 0xC3, 0x28]);
        assert!(matches!(reader.read_str(), Err(CodecError::InvalidUtf8(_))));
    }
}
