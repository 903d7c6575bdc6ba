//! Save files on disk: naming, atomic commits, backups and queries.

mod atomic;
mod backup;

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::{PersistenceError, Result};

pub(crate) use atomic::AtomicFile;
pub use backup::BackupPolicy;

/// Directory of save files named `<name>.<extension>`.
#[derive(Clone, Debug)]
pub struct SaveStore {
    dir: PathBuf,
    extension: String,
    temp_suffix: String,
    backup: BackupPolicy,
}

impl SaveStore {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            dir: config.save_dir.clone(),
            extension: config.extension.clone(),
            temp_suffix: config.temp_suffix.clone(),
            backup: config.backup,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn backup_policy(&self) -> BackupPolicy {
        self.backup
    }

    /// Path of the save called `name`.
    ///
    /// Names are plain file stems; anything that could escape the save
    /// directory is rejected.
    pub fn path_for(&self, name: &str) -> Result<PathBuf> {
        let invalid = name.is_empty()
            || name == "."
            || name.contains("..")
            || name.contains(['/', '\\', '\0']);
        if invalid {
            return Err(PersistenceError::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(format!("{name}.{}", self.extension)))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_ok_and(|path| path.is_file())
    }

    /// Deletes a save and all of its backups. Returns whether the save
    /// itself existed.
    pub fn delete(&self, name: &str) -> Result<bool> {
        let path = self.path_for(name)?;

        for backup in backup::existing(&path)? {
            fs::remove_file(&backup)?;
            debug!(target: "save_engine::store", path = %backup.display(), "Deleted backup");
        }

        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(target: "save_engine::store", path = %path.display(), "Deleted save");
                Ok(true)
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(error) => Err(error.into()),
        }
    }

    /// Size of the save in bytes.
    pub fn size(&self, name: &str) -> Result<u64> {
        Ok(self.metadata(name)?.len())
    }

    pub fn modified(&self, name: &str) -> Result<SystemTime> {
        Ok(self.metadata(name)?.modified()?)
    }

    /// Names of all saves in the directory, sorted.
    ///
    /// A missing directory has no saves.
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(error.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(self.extension.as_str())
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                names.push(stem.to_string());
            }
        }

        names.sort_unstable();
        Ok(names)
    }

    /// Backup files of `name`, newest first.
    pub fn backups(&self, name: &str) -> Result<Vec<PathBuf>> {
        Ok(backup::existing(&self.path_for(name)?)?)
    }

    /// Opens an existing save for reading.
    pub(crate) fn open(&self, name: &str) -> Result<(PathBuf, BufReader<File>)> {
        let path = self.path_for(name)?;
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Err(PersistenceError::FileNotFound(path));
            }
            Err(error) => return Err(error.into()),
        };
        if !file.metadata()?.is_file() {
            return Err(PersistenceError::FileNotFound(path));
        }
        Ok((path, BufReader::new(file)))
    }

    /// Starts writing `name` into a temp file beside it.
    pub(crate) fn begin_write(&self, name: &str) -> Result<AtomicFile> {
        let target = self.path_for(name)?;
        fs::create_dir_all(&self.dir)?;
        let temp = backup::append_extension(&target, &self.temp_suffix);
        AtomicFile::create(target, temp)
    }

    /// Rotates backups of the current save, then moves `file` into place.
    ///
    /// A failed rotation is logged and does not stop the commit.
    pub(crate) fn commit(&self, file: AtomicFile) -> Result<()> {
        if let Err(error) = backup::rotate(file.target(), self.backup) {
            warn!(
                target: "save_engine::store",
                path = %file.target().display(),
                error = %error,
                "Backup rotation failed"
            );
        }

        let target = file.target().to_path_buf();
        file.commit()?;
        debug!(target: "save_engine::store", path = %target.display(), "Committed save");
        Ok(())
    }

    fn metadata(&self, name: &str) -> Result<fs::Metadata> {
        let path = self.path_for(name)?;
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => Ok(meta),
            Ok(_) => Err(PersistenceError::FileNotFound(path)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                Err(PersistenceError::FileNotFound(path))
            }
            Err(error) => Err(error.into()),
        }
    }
}
