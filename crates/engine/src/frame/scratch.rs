//! Reusable payload arena shared by every frame of a save or load.

use std::io::{self, Read};

use save_codec::{ByteReader, ByteWriter};

/// Growable byte arena with an explicit logical length.
///
/// `storage` is the physical high-water mark: it grows to fit the largest
/// payload seen and is never shrunk. `len` is the size of the payload held by
/// the current operation; only `storage[..len]` is ever exposed, so a small
/// payload that follows a large one never sees the large one's tail.
#[derive(Debug, Default)]
pub struct ScratchBuffer {
    storage: Vec<u8>,
    len: usize,
}

impl ScratchBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Physical size of the arena.
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Logical length of the current payload.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The current payload.
    pub fn payload(&self) -> &[u8] {
        &self.storage[..self.len]
    }

    /// A reader scoped to exactly the current payload.
    pub fn reader(&self) -> ByteReader<'_> {
        ByteReader::new(self.payload())
    }

    /// Drops the current payload without releasing storage.
    pub fn reset(&mut self) {
        self.len = 0;
    }

    /// Runs `write` against an empty payload and records how much it wrote.
    pub fn record<T>(&mut self, write: impl FnOnce(&mut ByteWriter<'_>) -> T) -> T {
        self.len = 0;
        let mut writer = ByteWriter::new(&mut self.storage);
        let out = write(&mut writer);
        self.len = writer.position();
        out
    }

    /// Replaces the payload with exactly `len` bytes read from `source`.
    ///
    /// On error the payload is left empty.
    pub fn fill_from<R: Read>(&mut self, source: &mut R, len: usize) -> io::Result<()> {
        self.len = 0;
        if self.storage.len() < len {
            self.storage.resize(len, 0);
        }
        source.read_exact(&mut self.storage[..len])?;
        self.len = len;
        Ok(())
    }
}
