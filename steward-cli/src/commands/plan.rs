//! `steward plan` — per-resource decision table, no side effects.
//!
//! Internally a dry-run convergence: probes and diffs run for real, applies
//! and notifications do not.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use steward_engine::{converge, ConvergeOptions, Outcome, ResourceOutcome, RunReport};

/// Arguments for `steward plan`.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Path to the catalog YAML document.
    pub catalog: PathBuf,

    /// Host root all catalog paths resolve against.
    #[arg(long, default_value = "/")]
    pub root: PathBuf,

    /// Directory of `.tera` templates overriding the embedded defaults.
    #[arg(long)]
    pub template_dir: Option<PathBuf>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct PlanRow {
    #[tabled(rename = "resource")]
    resource: String,
    #[tabled(rename = "decision")]
    decision: String,
    #[tabled(rename = "detail")]
    detail: String,
}

impl PlanArgs {
    pub fn run(self) -> Result<()> {
        let catalog = super::load_catalog(&self.catalog, &self.root)?;
        let system = super::system_capabilities(&self.root, self.template_dir.as_deref())?;
        let caps = system.as_capabilities();

        let report = converge(&catalog, &caps, &ConvergeOptions { dry_run: true })
            .map_err(|failure| anyhow::Error::from(failure.error))
            .context("plan failed")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize plan JSON")?
            );
            return Ok(());
        }

        print_table(&report);
        Ok(())
    }
}

fn print_table(report: &RunReport) {
    println!(
        "steward v{} | {} resources | {} would change",
        env!("CARGO_PKG_VERSION"),
        report.outcomes.len(),
        report.changed(),
    );

    if report.outcomes.is_empty() {
        println!("Catalog declares no resources.");
        return;
    }

    let rows: Vec<PlanRow> = report.outcomes.iter().map(plan_row).collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    for n in &report.notifications {
        println!("  ↻  would notify: {} {}", n.action, n.target);
    }

    if report.changed() > 0 {
        println!("{}", "Run 'steward converge' to apply.".bright_black());
    }
}

fn plan_row(outcome: &ResourceOutcome) -> PlanRow {
    let detail = match &outcome.outcome {
        Outcome::Skipped { reason } => reason.clone(),
        Outcome::Failed { error } => error.clone(),
        _ => match &outcome.decision {
            steward_core::types::ChangeDecision::Update { fields } => fields
                .iter()
                .map(|f| f.field.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            _ => String::new(),
        },
    };
    PlanRow {
        resource: outcome.name.0.clone(),
        decision: outcome.decision.to_string(),
        detail,
    }
}
