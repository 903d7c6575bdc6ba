//! Numbered backups of the previous save, rotated on every commit.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

/// How many previous versions of a save to keep.
///
/// Backups sit next to the save as `<file>.bak1` (newest) through
/// `<file>.bak<keep>` (oldest).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackupPolicy {
    pub keep: usize,
}

impl BackupPolicy {
    pub const fn disabled() -> Self {
        Self { keep: 0 }
    }

    pub const fn keep(keep: usize) -> Self {
        Self { keep }
    }

    pub const fn is_enabled(&self) -> bool {
        self.keep > 0
    }
}

impl Default for BackupPolicy {
    fn default() -> Self {
        Self { keep: 1 }
    }
}

/// `<target>.bak<generation>`.
pub(crate) fn backup_path(target: &Path, generation: usize) -> PathBuf {
    append_extension(target, &format!("bak{generation}"))
}

pub(crate) fn append_extension(path: &Path, extension: &str) -> PathBuf {
    let mut raw = OsString::from(path.as_os_str());
    raw.push(".");
    raw.push(extension);
    PathBuf::from(raw)
}

/// Shifts existing backups down one generation and copies `target` into
/// the first slot. Does nothing when `target` does not exist.
pub(crate) fn rotate(target: &Path, policy: BackupPolicy) -> io::Result<()> {
    if !policy.is_enabled() || !target.is_file() {
        return Ok(());
    }

    let oldest = backup_path(target, policy.keep);
    if oldest.exists() {
        fs::remove_file(&oldest)?;
    }
    for generation in (1..policy.keep).rev() {
        let from = backup_path(target, generation);
        if from.exists() {
            fs::rename(&from, backup_path(target, generation + 1))?;
        }
    }
    fs::copy(target, backup_path(target, 1))?;

    debug!(
        target: "save_engine::store",
        path = %target.display(),
        keep = policy.keep,
        "Rotated backups"
    );
    Ok(())
}

/// Every `<target>.bak<N>` present on disk, ordered by generation.
pub(crate) fn existing(target: &Path) -> io::Result<Vec<PathBuf>> {
    let (Some(dir), Some(file_name)) = (target.parent(), target.file_name()) else {
        return Ok(Vec::new());
    };
    let Some(file_name) = file_name.to_str() else {
        return Ok(Vec::new());
    };
    let prefix = format!("{file_name}.bak");

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(error) => return Err(error),
    };

    let mut backups = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if let Some(name) = path.file_name().and_then(|n| n.to_str())
            && let Some(generation) = name
                .strip_prefix(&prefix)
                .and_then(|g| g.parse::<usize>().ok())
        {
            backups.push((generation, path));
        }
    }

    backups.sort_unstable_by_key(|(generation, _)| *generation);
    Ok(backups.into_iter().map(|(_, path)| path).collect())
}
