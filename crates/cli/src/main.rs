//! Operator tool for the combat core.
//!
//! `combat-sim resolve` runs one deterministic attack and prints the result as
//! JSON. `combat-sim skirmish` drives concurrent attackers against a single
//! character through the full lock + compare-and-swap runtime.

mod commands;
mod logging;

use anyhow::Result;
use clap::Parser;
use commands::{Resolve, Skirmish};

/// Combat resolution and stat mutation tools
#[derive(Parser)]
#[command(name = "combat-sim")]
#[command(about = "Resolve attacks and exercise the stat mutation runtime", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Resolve a single seeded attack
    Resolve(Resolve),

    /// Run concurrent attackers against one character
    Skirmish(Skirmish),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (LOCK_BACKEND, REDIS_URL, LOG_DIR, ...)
    let _ = dotenvy::dotenv();

    let _log_guard = logging::setup_logging()?;

    let cli = Cli::parse();

    match cli.command {
        Command::Resolve(cmd) => cmd.execute(),
        Command::Skirmish(cmd) => cmd.execute().await,
    }
}
