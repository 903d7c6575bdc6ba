//! List save files in the save directory

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::Parser;
use console::style;
use save_engine::{EngineConfig, SaveStore};

use super::format_bytes;

/// List save files with size and modification time
#[derive(Parser)]
pub struct List {
    /// Also show how many backups each save has
    #[arg(short, long)]
    backups: bool,
}

impl List {
    pub fn execute(self, config: &EngineConfig) -> Result<()> {
        let store = SaveStore::new(config);
        let names = store
            .list()
            .with_context(|| format!("Failed to list saves in {}", store.dir().display()))?;

        println!(
            "{} {}",
            style("Save Directory:").bold().cyan(),
            store.dir().display()
        );
        println!();

        if names.is_empty() {
            println!("{}", style("No saves found").dim());
            return Ok(());
        }

        for name in &names {
            let size = store.size(name)?;
            let modified: DateTime<Local> = store.modified(name)?.into();

            print!(
                "  {:<24} {:>12}  {}",
                style(name).bold(),
                format_bytes(size),
                style(modified.format("%Y-%m-%d %H:%M:%S")).dim()
            );
            if self.backups {
                let count = store.backups(name)?.len();
                print!("  {}", style(format!("{count} backups")).dim());
            }
            println!();
        }

        println!();
        println!("{} save(s)", names.len());
        Ok(())
    }
}
