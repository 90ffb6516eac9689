//! `liveconfig set <instance> <attr> <value> [--dry-run]`

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use liveconfig_store::SaveOutcome;

/// Arguments for `liveconfig set`.
#[derive(Args, Debug)]
pub struct SetArgs {
    /// Saved instance name.
    pub instance: String,

    /// Attribute name.
    pub attr: String,

    /// New value, written the way you would type it in the shell
    /// (e.g. `true`, `42`, `"(1, 2)"`, `"[a, b]"`).
    pub value: String,

    /// Show the coerced value without writing the save file.
    #[arg(long)]
    pub dry_run: bool,
}

impl SetArgs {
    pub fn run(self, file: Option<PathBuf>) -> Result<()> {
        let (mut handler, mut manager) = super::open(file)?;

        if !manager.set_attr_by_name(&self.instance, &self.attr, &self.value) {
            bail!(
                "could not set {}.{} to '{}' (unknown name or incompatible value)",
                self.instance,
                self.attr,
                self.value
            );
        }
        let value = manager
            .get_attr_by_name(&self.instance, &self.attr)
            .map(ToString::to_string)
            .unwrap_or_default();

        if self.dry_run {
            println!("[dry-run] {}.{} = {}", self.instance, self.attr, value);
            return Ok(());
        }

        let outcome = handler
            .save_manager(&manager)
            .with_context(|| format!("failed to write '{}'", handler.path().display()))?;
        let mark = "✓".green().bold();
        match outcome {
            SaveOutcome::Written { path } => {
                println!("{mark} {}.{} = {} ({})", self.instance, self.attr, value, path.display())
            }
            SaveOutcome::Unchanged { .. } => {
                println!("{mark} {}.{} = {} (unchanged)", self.instance, self.attr, value)
            }
        }
        Ok(())
    }
}
