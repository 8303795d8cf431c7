//! Steward — declarative host convergence CLI.
//!
//! # Usage
//!
//! ```text
//! steward converge <catalog.yaml> [--dry-run] [--root <path>] [--template-dir <path>]
//! steward plan <catalog.yaml> [--json] [--root <path>]
//! steward diff <catalog.yaml> [--root <path>]
//! steward detect [--root <path>] [--json]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    converge::ConvergeArgs, detect::DetectArgs, diff::DiffArgs, plan::PlanArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "steward",
    version,
    about = "Converge a host toward a declarative resource catalog",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Probe, diff, and apply the catalog against this host.
    Converge(ConvergeArgs),

    /// Show per-resource decisions without applying anything.
    Plan(PlanArgs),

    /// Show unified diffs of what converge would write.
    Diff(DiffArgs),

    /// Show the detected platform family.
    Detect(DetectArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Converge(args) => args.run(),
        Commands::Plan(args) => args.run(),
        Commands::Diff(args) => args.run(),
        Commands::Detect(args) => args.run(),
    }
}
