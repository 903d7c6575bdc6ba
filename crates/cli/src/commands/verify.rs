//! Structural check of a save file
//!
//! Walks every frame without dispatching it. Fails on the first unreadable
//! header or frame; duplicate identities and trailing bytes are reported as
//! warnings since a load tolerates them.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use save_engine::EngineConfig;

use super::{open_scanner, resolve_target};

/// Check that every frame of a save file can be read
#[derive(Parser)]
pub struct Verify {
    /// Save name in the save directory, or a path to a save file
    #[arg(value_name = "NAME|PATH")]
    target: String,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Verified {
    frames: usize,
    duplicates: Vec<String>,
    trailing_bytes: u64,
}

impl Verify {
    pub fn execute(self, config: &EngineConfig) -> Result<()> {
        let path = resolve_target(&self.target, config)?;

        let verified = match verify_file(&path, config) {
            Ok(verified) => verified,
            Err(error) => {
                eprintln!(
                    "{} {}",
                    style("✗").red().bold(),
                    style(path.display()).cyan()
                );
                return Err(error);
            }
        };

        for identity in &verified.duplicates {
            println!(
                "{} duplicate identity {} (later frames are ignored on load)",
                style("!").yellow().bold(),
                style(identity).cyan()
            );
        }
        if verified.trailing_bytes > 0 {
            println!(
                "{} {} trailing bytes after the last frame",
                style("!").yellow().bold(),
                verified.trailing_bytes
            );
        }

        println!(
            "{} {} ({} frames)",
            style("✓").green().bold(),
            path.display(),
            verified.frames
        );
        Ok(())
    }
}

fn verify_file(path: &Path, config: &EngineConfig) -> Result<Verified> {
    let size = std::fs::metadata(path)
        .with_context(|| format!("Failed to stat save file: {}", path.display()))?
        .len();

    let mut scanner = open_scanner(path, config)?;
    let declared = scanner.header().frame_count;

    let mut verified = Verified::default();
    let mut seen = HashSet::new();
    for frame in scanner.by_ref() {
        let frame = frame
            .with_context(|| format!("Frame {} of {declared} is unreadable", verified.frames + 1))?;
        if !seen.insert(frame.identity.clone()) {
            verified.duplicates.push(frame.identity);
        }
        verified.frames += 1;
    }

    tracing::debug!(
        path = %path.display(),
        frames = verified.frames,
        end = scanner.position(),
        size,
        "Walked save file"
    );
    verified.trailing_bytes = size.saturating_sub(scanner.position());
    Ok(verified)
}
