//! Temp-file-then-rename writes.

use std::fs::{self, File};
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{PersistenceError, Result};

/// A file written beside its target and moved into place on [`commit`].
///
/// Until `commit` succeeds the target is never touched. Dropping an
/// uncommitted `AtomicFile`, or a failed commit, removes the temp file.
///
/// [`commit`]: AtomicFile::commit
pub(crate) struct AtomicFile {
    target: PathBuf,
    temp: PathBuf,
    writer: Option<BufWriter<File>>,
    committed: bool,
}

impl AtomicFile {
    pub(crate) fn create(target: PathBuf, temp: PathBuf) -> Result<Self> {
        let file = File::create(&temp)?;
        Ok(Self {
            target,
            temp,
            writer: Some(BufWriter::new(file)),
            committed: false,
        })
    }

    pub(crate) fn target(&self) -> &Path {
        &self.target
    }

    /// Flushes and syncs the temp file, then renames it over the target.
    pub(crate) fn commit(mut self) -> Result<()> {
        let writer = self.writer.take().ok_or_else(closed)?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        drop(file);

        self.replace_target()
            .map_err(|source| PersistenceError::Commit {
                path: self.target.clone(),
                source,
            })?;
        self.committed = true;
        Ok(())
    }

    fn replace_target(&self) -> io::Result<()> {
        match fs::rename(&self.temp, &self.target) {
            Ok(()) => Ok(()),
            Err(error) if self.target.exists() => {
                warn!(
                    target: "save_engine::store",
                    path = %self.target.display(),
                    error = %error,
                    "Rename over existing save failed, replacing in two steps"
                );
                fs::remove_file(&self.target)?;
                fs::rename(&self.temp, &self.target)
            }
            Err(error) => Err(error),
        }
    }

    fn writer(&mut self) -> io::Result<&mut BufWriter<File>> {
        self.writer.as_mut().ok_or_else(closed)
    }
}

fn closed() -> io::Error {
    io::Error::other("atomic file already closed")
}

impl Write for AtomicFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer()?.flush()
    }
}

impl Seek for AtomicFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.writer()?.seek(pos)
    }
}

impl Drop for AtomicFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        drop(self.writer.take());
        if let Err(error) = fs::remove_file(&self.temp)
            && error.kind() != io::ErrorKind::NotFound
        {
            warn!(
                target: "save_engine::store",
                path = %self.temp.display(),
                error = %error,
                "Failed to remove temp file"
            );
        }
    }
}
