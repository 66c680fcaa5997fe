//! CLI implementation for `prebake clean`

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::output::status;
use crate::cli::OutputMode;
use crate::core::clean::clean;
use crate::core::manifest::Manifest;
use crate::infra::dirs::PrebakeDirs;

/// Execute the clean command
pub async fn execute(project_dir: &Path, all: bool, output: OutputMode) -> Result<()> {
    let manifest = Manifest::load_or_default(project_dir)?;
    let output_dir = project_dir.join(&manifest.build.output);

    let result = clean(&PrebakeDirs::new(), all.then_some(output_dir.as_path()))
        .context("Failed to clean")?;

    if output.quiet {
        return Ok(());
    }
    if result.removed.is_empty() {
        println!("{} Nothing to clean", status::SUCCESS);
    } else {
        println!("{} Cleaned {}:", status::SUCCESS, result.format_size());
        for dir in &result.removed {
            println!("  Removed {}", dir.display());
        }
    }

    Ok(())
}
