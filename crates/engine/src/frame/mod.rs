//! Save file layout and per-entity frames.
//!
//! A save file is a fixed header followed by `frame_count` frames written
//! back to back with no padding:
//!
//! ```text
//! [u32 magic][u32 version][i32 frame_count]
//! [var_u32 identity_len][identity utf-8][i32 payload_len][payload]
//! [var_u32 identity_len][identity utf-8][i32 payload_len][payload]
//! ...
//! ```
//!
//! All integers are little-endian. `payload_len` is always the exact number
//! of bytes the entity produced, so an unmatched frame can be skipped by that
//! many bytes whatever its content looks like.

mod codec;
mod scanner;
mod scratch;

use std::io::{self, Read, Seek, SeekFrom, Write};

use save_codec::{MAX_VAR_U32_LEN, VarU32Decoder, encode_var_u32};

use crate::error::{PersistenceError, Result};

pub(crate) use codec::{Encoded, encode_entity, read_frame};
pub use scanner::{FrameScanner, ScannedFrame};
pub use scratch::ScratchBuffer;

/// File magic, `b"SVKP"` read as a little-endian `u32`.
pub const MAGIC: u32 = u32::from_le_bytes(*b"SVKP");

/// Newest format version this build reads and the version it writes.
pub const FORMAT_VERSION: u32 = 1;

/// Size of [`FileHeader`] on disk.
pub const HEADER_LEN: u64 = 12;

const FRAME_COUNT_OFFSET: u64 = 8;

/// Upper bound on identity length accepted when reading.
const MAX_IDENTITY_LEN: usize = 64 * 1024;

/// Fixed header at the start of every save file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub magic: u32,
    pub version: u32,
    pub frame_count: i32,
}

impl FileHeader {
    /// Header for the current format version.
    pub fn new(frame_count: i32) -> Self {
        Self {
            magic: MAGIC,
            version: FORMAT_VERSION,
            frame_count,
        }
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.magic.to_le_bytes())?;
        writer.write_all(&self.version.to_le_bytes())?;
        writer.write_all(&self.frame_count.to_le_bytes())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut raw = [0u8; HEADER_LEN as usize];
        reader
            .read_exact(&mut raw)
            .map_err(|e| PersistenceError::truncated(e, "file header"))?;

        let field = |at: usize| [raw[at], raw[at + 1], raw[at + 2], raw[at + 3]];
        Ok(Self {
            magic: u32::from_le_bytes(field(0)),
            version: u32::from_le_bytes(field(4)),
            frame_count: i32::from_le_bytes(field(8)),
        })
    }

    /// Checks magic and version and returns the frame count.
    pub fn validate(&self) -> Result<usize> {
        if self.magic != MAGIC {
            return Err(PersistenceError::InvalidFormat { magic: self.magic });
        }
        if self.version > FORMAT_VERSION {
            return Err(PersistenceError::UnsupportedVersion {
                found: self.version,
                supported: FORMAT_VERSION,
            });
        }
        usize::try_from(self.frame_count).map_err(|_| {
            PersistenceError::CorruptedData(format!("negative frame count {}", self.frame_count))
        })
    }
}

/// Rewrites the frame count of a header already written at offset zero and
/// returns the writer to the end of the stream.
pub(crate) fn patch_frame_count<W: Write + Seek>(writer: &mut W, frame_count: i32) -> io::Result<()> {
    let end = writer.stream_position()?;
    writer.seek(SeekFrom::Start(FRAME_COUNT_OFFSET))?;
    writer.write_all(&frame_count.to_le_bytes())?;
    writer.seek(SeekFrom::Start(end))?;
    Ok(())
}

/// Writes one frame and returns the number of bytes it occupies.
pub(crate) fn write_frame<W: Write>(writer: &mut W, identity: &str, payload: &[u8]) -> Result<u64> {
    let too_large = || PersistenceError::FrameTooLarge {
        identity: identity.to_string(),
        len: payload.len(),
        limit: i32::MAX as usize,
    };
    let identity_len = u32::try_from(identity.len()).map_err(|_| too_large())?;
    let payload_len = i32::try_from(payload.len()).map_err(|_| too_large())?;

    let mut prefix = [0u8; MAX_VAR_U32_LEN];
    let prefix_len = encode_var_u32(identity_len, &mut prefix);

    writer.write_all(&prefix[..prefix_len])?;
    writer.write_all(identity.as_bytes())?;
    writer.write_all(&payload_len.to_le_bytes())?;
    writer.write_all(payload)?;

    Ok((prefix_len + identity.len() + 4 + payload.len()) as u64)
}

/// Identity and payload length of the frame at the reader's position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FrameHeader {
    pub identity: String,
    pub payload_len: usize,
    /// Bytes occupied by the identity prefix, identity and length field.
    pub header_len: usize,
}

pub(crate) fn read_frame_header<R: Read>(reader: &mut R, max_frame_len: usize) -> Result<FrameHeader> {
    let (identity_len, prefix_len) = read_var_u32(reader)?;
    let identity_len = identity_len as usize;
    if identity_len > MAX_IDENTITY_LEN {
        return Err(PersistenceError::CorruptedData(format!(
            "identity length {identity_len} exceeds {MAX_IDENTITY_LEN}"
        )));
    }

    let mut identity = vec![0u8; identity_len];
    reader
        .read_exact(&mut identity)
        .map_err(|e| PersistenceError::truncated(e, "frame identity"))?;
    let identity = String::from_utf8(identity)
        .map_err(|_| PersistenceError::CorruptedData("frame identity is not UTF-8".into()))?;

    let mut len = [0u8; 4];
    reader
        .read_exact(&mut len)
        .map_err(|e| PersistenceError::truncated(e, format!("length of frame `{identity}`")))?;
    let payload_len = i32::from_le_bytes(len);
    let payload_len = usize::try_from(payload_len).map_err(|_| {
        PersistenceError::CorruptedData(format!(
            "frame `{identity}` has negative length {payload_len}"
        ))
    })?;
    if payload_len > max_frame_len {
        return Err(PersistenceError::FrameTooLarge {
            identity,
            len: payload_len,
            limit: max_frame_len,
        });
    }

    Ok(FrameHeader {
        identity,
        payload_len,
        header_len: prefix_len + identity_len + 4,
    })
}

/// Reads a `var_u32` from a stream, returning the value and its encoded size.
fn read_var_u32<R: Read>(reader: &mut R) -> Result<(u32, usize)> {
    let mut decoder = VarU32Decoder::default();
    let mut byte = [0u8; 1];
    for consumed in 1..=MAX_VAR_U32_LEN {
        reader
            .read_exact(&mut byte)
            .map_err(|e| PersistenceError::truncated(e, "frame identity length"))?;
        let step = decoder
            .push(byte[0])
            .map_err(|e| PersistenceError::CorruptedData(e.to_string()))?;
        if let Some(value) = step {
            return Ok((value, consumed));
        }
    }
    Err(PersistenceError::CorruptedData(
        "frame identity length is not a valid var_u32".into(),
    ))
}
