//! `steward detect` — show the detected platform family.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use steward_detect::{detect_platform, Confidence};

/// Arguments for `steward detect`.
#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Host root to inspect.
    #[arg(long, default_value = "/")]
    pub root: PathBuf,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl DetectArgs {
    pub fn run(self) -> Result<()> {
        let platform = detect_platform(&self.root)
            .with_context(|| format!("platform detection failed under '{}'", self.root.display()))?;

        let confidence = match platform.confidence {
            Confidence::High => "high",
            Confidence::Medium => "medium",
        };

        if self.json {
            let payload = serde_json::json!({
                "family": platform.family.to_string(),
                "id": platform.id,
                "pretty_name": platform.pretty_name,
                "confidence": confidence,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize JSON")?
            );
            return Ok(());
        }

        match &platform.pretty_name {
            Some(pretty) => println!("{} — {} ({confidence})", platform.family, pretty),
            None => println!("{} — id '{}' ({confidence})", platform.family, platform.id),
        }
        Ok(())
    }
}
