//! `steward diff <catalog>` — unified diffs of what converge would write.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use steward_engine::preview;

/// Arguments for `steward diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Path to the catalog YAML document.
    pub catalog: PathBuf,

    /// Host root all catalog paths resolve against.
    #[arg(long, default_value = "/")]
    pub root: PathBuf,

    /// Directory of `.tera` templates overriding the embedded defaults.
    #[arg(long)]
    pub template_dir: Option<PathBuf>,
}

impl DiffArgs {
    pub fn run(self) -> Result<()> {
        let catalog = super::load_catalog(&self.catalog, &self.root)?;
        let system = super::system_capabilities(&self.root, self.template_dir.as_deref())?;
        let caps = system.as_capabilities();

        let diffs = preview(&catalog, &caps)
            .with_context(|| format!("diff failed for '{}'", self.catalog.display()))?;

        if diffs.is_empty() {
            println!("No differences.");
            return Ok(());
        }

        for diff in diffs {
            print!("{}", diff.unified_diff);
            if !diff.unified_diff.ends_with('\n') {
                println!();
            }
        }

        Ok(())
    }
}
