//! Read-only walk over a save file's frames, without dispatching them.

use std::io::Read;

use super::{FileHeader, HEADER_LEN, read_frame_header};
use crate::error::{PersistenceError, Result};

/// A frame read by [`FrameScanner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFrame {
    pub identity: String,
    /// Byte offset of the frame from the start of the file.
    pub offset: u64,
    pub payload: Vec<u8>,
}

/// Iterates over the frames of a save file.
///
/// The header is validated on construction. Iteration stops after the
/// declared frame count or after the first error.
pub struct FrameScanner<R> {
    reader: R,
    header: FileHeader,
    remaining: usize,
    offset: u64,
    max_frame_len: usize,
}

impl<R: Read> FrameScanner<R> {
    pub fn new(mut reader: R, max_frame_len: usize) -> Result<Self> {
        let header = FileHeader::read_from(&mut reader)?;
        let remaining = header.validate()?;
        Ok(Self {
            reader,
            header,
            remaining,
            offset: HEADER_LEN,
            max_frame_len,
        })
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Offset just past the last frame read successfully.
    pub fn position(&self) -> u64 {
        self.offset
    }

    fn next_frame(&mut self) -> Result<ScannedFrame> {
        let header = read_frame_header(&mut self.reader, self.max_frame_len)?;
        let mut payload = vec![0u8; header.payload_len];
        self.reader.read_exact(&mut payload).map_err(|e| {
            PersistenceError::truncated(e, format!("payload of frame `{}`", header.identity))
        })?;

        let frame = ScannedFrame {
            identity: header.identity,
            offset: self.offset,
            payload,
        };
        self.offset += (header.header_len + header.payload_len) as u64;
        Ok(frame)
    }
}

impl<R: Read> Iterator for FrameScanner<R> {
    type Item = Result<ScannedFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let frame = self.next_frame();
        if frame.is_err() {
            self.remaining = 0;
        }
        Some(frame)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::frame::write_frame;

    fn file_with(frames: &[(&str, &[u8])]) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        FileHeader::new(frames.len() as i32)
            .write_to(&mut out)
            .unwrap();
        for (identity, payload) in frames {
            write_frame(&mut out, identity, payload).unwrap();
        }
        out.into_inner()
    }

    #[test]
    fn scans_every_frame_with_offsets() {
        let bytes = file_with(&[("A", &[1, 2]), ("BB", &[])]);
        let frames: Vec<_> = FrameScanner::new(bytes.as_slice(), 1024)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].identity, "A");
        assert_eq!(frames[0].offset, HEADER_LEN);
        assert_eq!(frames[0].payload, vec![1, 2]);
        assert_eq!(frames[1].identity, "BB");
        assert_eq!(frames[1].offset, HEADER_LEN + 1 + 1 + 4 + 2);
    }

    #[test]
    fn position_ends_at_last_frame() {
        let bytes = file_with(&[("A", &[1, 2, 3])]);
        let mut scanner = FrameScanner::new(bytes.as_slice(), 1024).unwrap();
        assert_eq!(scanner.position(), HEADER_LEN);
        scanner.next().unwrap().unwrap();
        assert_eq!(scanner.position(), bytes.len() as u64);
    }

    #[test]
    fn stops_after_truncation() {
        let mut bytes = file_with(&[("A", &[1, 2, 3, 4]), ("B", &[5])]);
        bytes.truncate(bytes.len() - 8);
        let mut scanner = FrameScanner::new(bytes.as_slice(), 1024).unwrap();

        assert!(matches!(
            scanner.next(),
            Some(Err(PersistenceError::CorruptedData(_)))
        ));
        assert!(scanner.next().is_none());
    }
}
