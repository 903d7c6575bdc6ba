//! Engine configuration and environment loading.
use std::env;
use std::path::PathBuf;

use crate::store::BackupPolicy;

/// Default upper bound for a single frame payload (64 MiB).
pub const DEFAULT_MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Where save files live and how they are written.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Directory holding save files.
    pub save_dir: PathBuf,
    /// File extension for save files, without the leading dot.
    pub extension: String,
    /// Extra extension appended to the target while a save is in progress.
    pub temp_suffix: String,
    pub backup: BackupPolicy,
    /// Largest payload accepted for a single frame, on save and on load.
    pub max_frame_len: usize,
}

impl EngineConfig {
    /// Configuration rooted at `save_dir` with every other setting defaulted.
    pub fn new(save_dir: impl Into<PathBuf>) -> Self {
        Self {
            save_dir: save_dir.into(),
            ..Self::default()
        }
    }

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `SAVE_DIR` - Directory for save files (default: platform data dir)
    /// - `SAVE_EXTENSION` - Save file extension (default: `sav`)
    /// - `SAVE_BACKUPS` - Backups kept per save, `0` disables (default: 1)
    /// - `SAVE_MAX_FRAME_BYTES` - Per-frame payload limit (default: 64 MiB)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = env::var("SAVE_DIR") {
            config.save_dir = PathBuf::from(dir);
        }

        if let Ok(extension) = env::var("SAVE_EXTENSION") {
            let extension = extension.trim_start_matches('.');
            if !extension.is_empty() {
                config.extension = extension.to_string();
            }
        }

        if let Some(keep) = read_env::<usize>("SAVE_BACKUPS") {
            config.backup = BackupPolicy { keep };
        }

        if let Some(limit) = read_env::<usize>("SAVE_MAX_FRAME_BYTES") {
            config.max_frame_len = limit.max(1);
        }

        config
    }

    pub fn with_backup(mut self, backup: BackupPolicy) -> Self {
        self.backup = backup;
        self
    }

    pub fn with_max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.max_frame_len = max_frame_len;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            save_dir: default_save_dir(),
            extension: "sav".to_string(),
            temp_suffix: "tmp".to_string(),
            backup: BackupPolicy::default(),
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

/// Platform data directory for save files.
///
/// - macOS: `~/Library/Application Support/savekeep/saves`
/// - Linux: `~/.local/share/savekeep/saves` (or `$XDG_DATA_HOME/savekeep/saves`)
/// - Windows: `%APPDATA%\savekeep\data\saves`
/// - Fallback: `./save_data`
pub fn default_save_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "savekeep")
        .map(|dirs| dirs.data_dir().join("saves"))
        .unwrap_or_else(|| PathBuf::from("./save_data"))
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::new("/tmp/saves");
        assert_eq!(config.save_dir, PathBuf::from("/tmp/saves"));
        assert_eq!(config.extension, "sav");
        assert_eq!(config.temp_suffix, "tmp");
        assert_eq!(config.backup.keep, 1);
        assert_eq!(config.max_frame_len, DEFAULT_MAX_FRAME_LEN);
    }

    #[test]
    fn builders_override() {
        let config = EngineConfig::new("x")
            .with_backup(BackupPolicy::disabled())
            .with_max_frame_len(128);
        assert_eq!(config.backup.keep, 0);
        assert_eq!(config.max_frame_len, 128);
    }
}
