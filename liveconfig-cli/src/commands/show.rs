//! `liveconfig show [--json]`: saved instances and their attributes.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use liveconfig_core::LiveManager;

/// Arguments for `liveconfig show`.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Only show this instance.
    pub instance: Option<String>,

    /// Emit the saved state as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct AttrRow {
    #[tabled(rename = "attribute")]
    attr: String,
    #[tabled(rename = "kind")]
    kind: String,
    #[tabled(rename = "value")]
    value: String,
}

impl ShowArgs {
    pub fn run(self, file: Option<PathBuf>) -> Result<()> {
        let (handler, manager) = super::open(file)?;

        if self.json {
            if let Some(only) = &self.instance {
                if manager.get_instance(only).is_none() {
                    bail!("No saved instance named '{only}'.");
                }
            }
            let mut state = manager.serialize();
            if let (Some(only), Some(snapshot)) = (&self.instance, state.live_instances.as_mut()) {
                snapshot.retain(|name, _| name.0 == *only);
            }
            println!("{}", serde_json::to_string_pretty(&state)?);
            return Ok(());
        }

        println!(
            "LiveConfig v{} | {} | {} instance(s)",
            env!("CARGO_PKG_VERSION"),
            handler.path().display(),
            manager.instance_count()
        );
        print_tables(&manager, self.instance.as_deref());
        Ok(())
    }
}

fn print_tables(manager: &LiveManager, only: Option<&str>) {
    let mut shown = 0;
    for (name, object) in manager.instances() {
        if only.is_some_and(|o| o != name.0) {
            continue;
        }
        shown += 1;
        println!("{}", name.0.bold());
        let rows: Vec<AttrRow> = object
            .tracked_attrs()
            .map(|(attr, value)| AttrRow {
                attr: attr.clone(),
                kind: value.kind().to_string(),
                value: value.to_string(),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }

    if shown == 0 {
        match only {
            Some(name) => println!("No saved instance named '{name}'."),
            None => println!("No saved instances."),
        }
    }
}
