//! LiveConfig: inspect and tune saved live-instance state.
//!
//! # Usage
//!
//! ```text
//! liveconfig [--file <path>] show [<instance>] [--json]
//! liveconfig [--file <path>] get <instance> <attr>
//! liveconfig [--file <path>] set <instance> <attr> <value> [--dry-run]
//! liveconfig [--file <path>] shell
//! ```
//!
//! Without `--file` the save file is `~/.liveconfig/live_state.json`.
//! Log verbosity follows `RUST_LOG` (default `warn`).

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{get::GetArgs, set::SetArgs, shell::ShellArgs, show::ShowArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "liveconfig",
    version,
    about = "Inspect and tune the saved state of live-tracked instances",
    long_about = None,
)]
struct Cli {
    /// Save file to operate on (`.json`, `.yaml` or `.yml`).
    #[arg(long, short = 'f', global = true, value_name = "PATH")]
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List saved instances and their attributes.
    Show(ShowArgs),

    /// Print one saved attribute.
    Get(GetArgs),

    /// Update one saved attribute, coerced to its current kind.
    Set(SetArgs),

    /// Interactive shell over the save file.
    Shell(ShellArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Show(args) => args.run(cli.file),
        Commands::Get(args) => args.run(cli.file),
        Commands::Set(args) => args.run(cli.file),
        Commands::Shell(args) => args.run(cli.file),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
