//! `steward converge` — probe, diff, and apply the catalog.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use steward_engine::{converge, ConvergeOptions, Outcome, RunReport};

/// Arguments for `steward converge`.
#[derive(Args, Debug)]
pub struct ConvergeArgs {
    /// Path to the catalog YAML document.
    pub catalog: PathBuf,

    /// Report what would change without applying, firing, or persisting.
    #[arg(long)]
    pub dry_run: bool,

    /// Host root all catalog paths resolve against.
    #[arg(long, default_value = "/")]
    pub root: PathBuf,

    /// Directory of `.tera` templates overriding the embedded defaults.
    #[arg(long)]
    pub template_dir: Option<PathBuf>,
}

impl ConvergeArgs {
    pub fn run(self) -> Result<()> {
        let catalog = super::load_catalog(&self.catalog, &self.root)?;
        let system = super::system_capabilities(&self.root, self.template_dir.as_deref())?;
        let caps = system.as_capabilities();

        match converge(&catalog, &caps, &ConvergeOptions { dry_run: self.dry_run }) {
            Ok(report) => {
                print_report(&report, self.dry_run);
                Ok(())
            }
            Err(failure) => {
                print_report(&failure.partial, self.dry_run);
                eprintln!("{} {}", "✗ converge aborted:".red().bold(), failure.error);
                Err(failure.error.into())
            }
        }
    }
}

pub(crate) fn print_report(report: &RunReport, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    let changed = report.changed();
    let unchanged = report
        .outcomes
        .iter()
        .filter(|o| matches!(o.outcome, Outcome::Unchanged))
        .count();
    let skipped = report
        .outcomes
        .iter()
        .filter(|o| matches!(o.outcome, Outcome::Skipped { .. }))
        .count();

    let took = report
        .finished_at
        .signed_duration_since(report.started_at)
        .num_milliseconds();
    if changed == 0 {
        println!(
            "{prefix}✓ converged — nothing to do ({unchanged} unchanged, {skipped} skipped, {took}ms)"
        );
    } else {
        println!(
            "{prefix}✓ converged ({changed} changed, {unchanged} unchanged, {skipped} skipped, {took}ms)"
        );
    }

    for o in &report.outcomes {
        match &o.outcome {
            Outcome::Applied => println!("  ✎  {} ({})", o.name, o.decision),
            Outcome::WouldApply => println!("  ~  {} ({})", o.name, o.decision),
            Outcome::Unchanged => println!("  ·  {}", o.name),
            Outcome::Skipped { reason } => {
                println!("  ⊘  {} ({})", o.name, reason.bright_black())
            }
            Outcome::Failed { error } => println!("  ✗  {} ({})", o.name, error.red()),
        }
    }

    for n in &report.notifications {
        let verb = if n.fired { "notified" } else { "would notify" };
        println!("  ↻  {verb}: {} {}", n.action, n.target);
    }

    let before = match report.ledger.before {
        Some(state) => format!("{state:?}").to_lowercase(),
        None => "absent".to_string(),
    };
    let after = format!("{:?}", report.ledger.after).to_lowercase();
    let written = if report.ledger.written { "written" } else { "not written" };
    println!("  ledger: {before} → {after} ({written})");
}
