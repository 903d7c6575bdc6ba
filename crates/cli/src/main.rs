//! Operator tool for save files.
//!
//! Reads the frame layout directly, so it works without any of the entities
//! that wrote the file. Run with: `savectl <command>`

mod commands;
mod config;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use commands::{Delete, Inspect, List, Verify};
use config::CliConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Inspect and manage save files
#[derive(Parser)]
#[command(name = "savectl")]
#[command(about = "Inspect and manage save files", long_about = None)]
#[command(version)]
struct Cli {
    /// Save directory (defaults to SAVE_DIR or the platform data directory)
    #[arg(long, global = true, value_name = "DIR")]
    save_dir: Option<PathBuf>,

    /// Also write logs to savectl.log in this directory
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Show the header and frame listing of a save file
    Inspect(Inspect),

    /// Check that every frame of a save file can be read
    Verify(Verify),

    /// List save files with size and modification time
    List(List),

    /// Delete a save file and its backups
    Delete(Delete),
}

fn main() -> Result<()> {
    // Load .env file if it exists (for SAVE_DIR and other env vars)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = CliConfig::from_env().with_overrides(cli.save_dir, cli.log_dir);

    let _guard = setup_logging(config.log_dir.as_deref())?;
    tracing::debug!(save_dir = %config.engine.save_dir.display(), "Configuration loaded");

    match cli.command {
        Command::Inspect(cmd) => cmd.execute(&config.engine),
        Command::Verify(cmd) => cmd.execute(&config.engine),
        Command::List(cmd) => cmd.execute(&config.engine),
        Command::Delete(cmd) => cmd.execute(&config.engine),
    }
}

/// Logs to stderr, and to `<log_dir>/savectl.log` when a directory is given.
///
/// The returned guard must be held until exit so buffered file output is
/// flushed.
fn setup_logging(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
            let file_appender = tracing_appender::rolling::never(dir, "savectl.log");
            let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking_file)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}
