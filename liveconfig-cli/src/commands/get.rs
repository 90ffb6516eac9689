//! `liveconfig get <instance> <attr>`

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Args;

/// Arguments for `liveconfig get`.
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Saved instance name.
    pub instance: String,

    /// Attribute name.
    pub attr: String,
}

impl GetArgs {
    pub fn run(self, file: Option<PathBuf>) -> Result<()> {
        let (_, manager) = super::open(file)?;
        let value = manager
            .get_attr_by_name(&self.instance, &self.attr)
            .ok_or_else(|| anyhow!("no attribute '{}' on '{}'", self.attr, self.instance))?;
        println!("{value}");
        Ok(())
    }
}
