//! CLI implementation for `prebake plan`
//!
//! Prints the ordered units of a run. The JSON form is the input for
//! project generators.

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::output::status;
use crate::cli::OutputMode;
use crate::core::planner::RunMode;
use crate::core::project::Project;

/// Execute the plan command
pub async fn execute(
    project_dir: &Path,
    mode: RunMode,
    graph: Option<&Path>,
    output: OutputMode,
) -> Result<()> {
    let project = Project::load(project_dir, graph)
        .with_context(|| format!("Failed to load project in {}", project_dir.display()))?;
    let order = project.build_order(mode)?;
    let planned = project.planned_units(&order);

    if output.json {
        println!("{}", serde_json::to_string_pretty(&planned)?);
        return Ok(());
    }
    if output.quiet {
        return Ok(());
    }

    if planned.is_empty() {
        println!("{} Nothing to build ({mode})", status::SUCCESS);
        return Ok(());
    }

    println!("Build order ({mode}):");
    for (index, unit) in planned.iter().enumerate() {
        println!(
            "{:>4}. {} ({}, {})",
            index + 1,
            unit.target,
            unit.package,
            unit.product
        );
    }

    Ok(())
}
