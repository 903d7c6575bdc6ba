//! Command implementations for savectl
//!
//! Each command is a separate module that implements its own CLI args and execution logic.

mod delete;
mod inspect;
mod list;
mod verify;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use save_engine::{EngineConfig, FrameScanner, SaveStore};

pub use delete::Delete;
pub use inspect::Inspect;
pub use list::List;
pub use verify::Verify;

/// Resolves a command-line target to a file path.
///
/// Anything that looks like a path (has a separator, or names an existing
/// file) is used as given; otherwise it is a save name in the save directory.
fn resolve_target(target: &str, config: &EngineConfig) -> Result<PathBuf> {
    let as_path = Path::new(target);
    if target.contains(['/', '\\']) || as_path.is_file() {
        return Ok(as_path.to_path_buf());
    }

    SaveStore::new(config)
        .path_for(target)
        .with_context(|| format!("Invalid save name: {target}"))
}

fn open_scanner(path: &Path, config: &EngineConfig) -> Result<FrameScanner<BufReader<File>>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open save file: {}", path.display()))?;
    FrameScanner::new(BufReader::new(file), config.max_frame_len)
        .with_context(|| format!("Failed to read save header: {}", path.display()))
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
