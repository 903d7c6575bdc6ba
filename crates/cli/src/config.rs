//! savectl runtime configuration.
use std::env;
use std::path::PathBuf;

use save_engine::EngineConfig;

/// Settings gathered from the environment before command-line overrides.
#[derive(Clone, Debug)]
pub struct CliConfig {
    pub engine: EngineConfig,
    pub log_dir: Option<PathBuf>,
}

impl CliConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `SAVECTL_LOG_DIR` - Also write logs to `savectl.log` in this directory
    /// - everything read by [`EngineConfig::from_env`]
    pub fn from_env() -> Self {
        Self {
            engine: EngineConfig::from_env(),
            log_dir: env::var_os("SAVECTL_LOG_DIR").map(PathBuf::from),
        }
    }

    /// Applies `--save-dir` and `--log-dir`.
    pub fn with_overrides(mut self, save_dir: Option<PathBuf>, log_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = save_dir {
            self.engine.save_dir = dir;
        }
        if log_dir.is_some() {
            self.log_dir = log_dir;
        }
        self
    }
}
