pub mod get;
pub mod set;
pub mod shell;
pub mod show;

use std::path::PathBuf;

use anyhow::{Context, Result};

use liveconfig_core::LiveManager;
use liveconfig_store::FileHandler;

/// Open the save file (explicit path or the default location) and rebuild
/// its instances.
pub fn open(file: Option<PathBuf>) -> Result<(FileHandler, LiveManager)> {
    let handler = match file {
        Some(path) => FileHandler::open(&path)
            .with_context(|| format!("failed to open save file '{}'", path.display()))?,
        None => FileHandler::open_default().context("failed to open default save file")?,
    };
    let manager = liveconfig_cli::hydrate(handler.loaded_values())
        .with_context(|| format!("failed to restore '{}'", handler.path().display()))?;
    tracing::debug!(
        "restored {} instance(s) from {}",
        manager.instance_count(),
        handler.path().display()
    );
    Ok((handler, manager))
}
