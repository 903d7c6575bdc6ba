//! Delete a save and its backups
//!
//! Prompts for confirmation unless `--yes` is given.

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use save_engine::{EngineConfig, SaveStore};

/// Delete a save file and its backups
#[derive(Parser, Debug)]
pub struct Delete {
    /// Save name in the save directory
    #[arg(value_name = "NAME")]
    name: String,

    /// Skip confirmation prompt
    #[arg(short = 'y', long)]
    yes: bool,
}

impl Delete {
    pub fn execute(self, config: &EngineConfig) -> Result<()> {
        let store = SaveStore::new(config);
        let path = store
            .path_for(&self.name)
            .with_context(|| format!("Invalid save name: {}", self.name))?;

        if !store.exists(&self.name) {
            anyhow::bail!("Save not found: {}", path.display());
        }
        let backups = store.backups(&self.name)?;

        println!("The following will be deleted:");
        println!("  {} {}", style("→").cyan(), path.display());
        for backup in &backups {
            println!("  {} {}", style("→").cyan(), style(backup.display()).dim());
        }
        println!();

        if !self.yes && !confirm()? {
            println!("{}", style("Cancelled").dim());
            return Ok(());
        }

        store
            .delete(&self.name)
            .with_context(|| format!("Failed to delete: {}", path.display()))?;
        tracing::info!(name = %self.name, backups = backups.len(), "Deleted save");

        println!("{} Deleted {}", style("✓").green().bold(), self.name);
        Ok(())
    }
}

/// Prompt user for confirmation
fn confirm() -> Result<bool> {
    print!("{} ", style("Proceed? [y/N]").yellow().bold());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}
