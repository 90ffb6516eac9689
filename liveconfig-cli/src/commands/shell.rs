//! `liveconfig shell`: interactive shell over a save file.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use liveconfig_cli::Shell;

/// Arguments for `liveconfig shell`.
#[derive(Args, Debug)]
pub struct ShellArgs {}

impl ShellArgs {
    pub fn run(self, file: Option<PathBuf>) -> Result<()> {
        let (mut handler, mut manager) = super::open(file)?;
        eprintln!(
            "editing {} ({} instance(s)); type 'help' for commands",
            handler.path().display(),
            manager.instance_count()
        );
        Shell::new(&mut manager)
            .with_file_handler(&mut handler)
            .run(io::stdin().lock(), io::stdout().lock())
            .context("shell I/O failed")
    }
}
