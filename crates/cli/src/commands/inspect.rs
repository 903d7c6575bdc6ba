//! Show the header and frames of a save file
//!
//! Frames are listed with their identity, offset and payload length. Payload
//! bytes are never interpreted.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use save_engine::{EngineConfig, MAGIC};
use serde::Serialize;

use super::{format_bytes, open_scanner, resolve_target};

/// Show the header and frame listing of a save file
#[derive(Parser)]
pub struct Inspect {
    /// Save name in the save directory, or a path to a save file
    #[arg(value_name = "NAME|PATH")]
    target: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    format: OutputFormat,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    /// Header fields and a frame table
    Summary,
    /// Full JSON output
    Json,
}

#[derive(Debug, Serialize)]
struct SaveSummary {
    path: PathBuf,
    size: u64,
    magic: String,
    version: u32,
    frame_count: i32,
    frames: Vec<FrameSummary>,
}

#[derive(Debug, Serialize)]
struct FrameSummary {
    identity: String,
    offset: u64,
    length: usize,
}

impl Inspect {
    pub fn execute(self, config: &EngineConfig) -> Result<()> {
        let path = resolve_target(&self.target, config)?;
        let summary = read_summary(&path, config)?;

        match self.format {
            OutputFormat::Summary => print_summary(&summary),
            OutputFormat::Json => print_json(&summary)?,
        }

        Ok(())
    }
}

fn read_summary(path: &Path, config: &EngineConfig) -> Result<SaveSummary> {
    let size = std::fs::metadata(path)
        .with_context(|| format!("Failed to stat save file: {}", path.display()))?
        .len();

    let mut scanner = open_scanner(path, config)?;
    let header = *scanner.header();

    let mut frames = Vec::new();
    for frame in scanner.by_ref() {
        let frame = frame.with_context(|| {
            format!(
                "Frame {} of {} is unreadable",
                frames.len() + 1,
                header.frame_count
            )
        })?;
        frames.push(FrameSummary {
            identity: frame.identity,
            offset: frame.offset,
            length: frame.payload.len(),
        });
    }

    Ok(SaveSummary {
        path: path.to_path_buf(),
        size,
        magic: magic_text(header.magic),
        version: header.version,
        frame_count: header.frame_count,
        frames,
    })
}

fn magic_text(magic: u32) -> String {
    let bytes = magic.to_le_bytes();
    if magic == MAGIC {
        String::from_utf8_lossy(&bytes).into_owned()
    } else {
        format!("0x{magic:08X}")
    }
}

fn print_summary(summary: &SaveSummary) {
    println!(
        "{} {}",
        style("Save File:").bold().cyan(),
        summary.path.display()
    );
    println!(
        "{} {}",
        style("File Size:").bold().cyan(),
        format_bytes(summary.size)
    );
    println!(
        "{} {} (version {})",
        style("Format:").bold().cyan(),
        summary.magic,
        summary.version
    );
    println!("{} {}", style("Frames:").bold().cyan(), summary.frame_count);
    println!();

    if summary.frames.is_empty() {
        println!("{}", style("No frames").dim());
        return;
    }

    let width = summary
        .frames
        .iter()
        .map(|f| f.identity.len())
        .max()
        .unwrap_or(0)
        .max("IDENTITY".len());

    println!(
        "  {:<width$}  {:>10}  {:>12}",
        style("IDENTITY").bold().yellow(),
        style("OFFSET").bold().yellow(),
        style("LENGTH").bold().yellow(),
    );
    for frame in &summary.frames {
        println!(
            "  {:<width$}  {:>10}  {:>12}",
            frame.identity,
            frame.offset,
            format_bytes(frame.length as u64)
        );
    }
    println!();
}

fn print_json(summary: &SaveSummary) -> Result<()> {
    let json =
        serde_json::to_string_pretty(summary).context("Failed to serialize summary to JSON")?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use save_engine::{ByteReader, ByteWriter, CodecRegistry, EntityError, Persistent, SaveContext};
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::TempDir;

    use super::*;

    struct Counter {
        id: &'static str,
        value: u64,
    }

    impl Persistent for Counter {
        fn identity(&self) -> &str {
            self.id
        }

        fn serialize(&self, sink: &mut ByteWriter<'_>, _: &CodecRegistry) -> Result<(), EntityError> {
            sink.write_u64(self.value);
            Ok(())
        }

        fn restore(
            &mut self,
            source: Option<&mut ByteReader<'_>>,
            _: &CodecRegistry,
        ) -> Result<(), EntityError> {
            if let Some(source) = source {
                self.value = source.read_u64()?;
            }
            Ok(())
        }
    }

    #[test]
    fn summary_lists_frames_in_file_order() {
        let dir = TempDir::new().unwrap();
        let config = EngineConfig::new(dir.path());
        let mut ctx = SaveContext::new(config.clone());

        let first = Rc::new(RefCell::new(Counter { id: "first", value: 1 }));
        let second = Rc::new(RefCell::new(Counter { id: "second", value: 2 }));
        ctx.register(&first).unwrap();
        ctx.register(&second).unwrap();
        let report = ctx.save("slot").unwrap();

        let summary = read_summary(&report.path, &config).unwrap();
        assert_eq!(summary.magic, "SVKP");
        assert_eq!(summary.frame_count, 2);
        assert_eq!(summary.size, report.bytes);

        let identities: Vec<_> = summary.frames.iter().map(|f| f.identity.as_str()).collect();
        assert_eq!(identities, vec!["first", "second"]);
        assert!(summary.frames.iter().all(|f| f.length == 8));
        assert_eq!(summary.frames[0].offset, save_engine::HEADER_LEN);
    }
}
