//! Build command implementation
//!
//! Implements `prebake create` and `prebake prepare`: plan the run, then
//! hand the ordered units to the orchestrator.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::output::{create_build_bar, create_spinner, status};
use crate::cli::OutputMode;
use crate::core::builder::{BuildEvent, BuildOptions, BuildOrchestrator, BuildOutcome};
use crate::core::manifest::Manifest;
use crate::core::planner::{BuildUnit, RunMode};
use crate::core::project::Project;
use crate::infra::dirs::PrebakeDirs;
use crate::infra::toolchain::CommandToolchain;

use super::BuildArgs;

/// One line of the JSON build report
#[derive(Debug, Serialize)]
struct BundleReport<'a> {
    package: &'a str,
    target: &'a str,
    path: &'a Path,
    cached: bool,
}

/// Merge config file options with command-line flags
pub fn build_options(manifest: &Manifest, args: &BuildArgs) -> BuildOptions {
    let mut options = BuildOptions::from(&manifest.build);
    if let Some(configuration) = args.configuration {
        options.configuration = configuration;
    }
    if !args.platform.is_empty() {
        options.platforms = args.platform.clone();
    }
    options.include_simulators |= args.simulators;
    options.embed_debug_symbols |= args.embed_debug_symbols;
    options.cache |= args.cache;
    options
}

fn plan(project_dir: &Path, graph: Option<&Path>, mode: RunMode) -> Result<(Project, Vec<BuildUnit>)> {
    let project = Project::load(project_dir, graph)
        .with_context(|| format!("Failed to load project in {}", project_dir.display()))?;
    let order = project.build_order(mode)?;
    Ok((project, order))
}

/// Execute a build run
pub async fn execute(
    project_dir: &Path,
    mode: RunMode,
    args: &BuildArgs,
    output: OutputMode,
) -> Result<()> {
    let spinner = create_spinner("Resolving build order...", !output.show_progress());
    let planned = plan(project_dir, args.graph.as_deref(), mode);
    spinner.finish_and_clear();
    let (project, order) = planned?;

    if order.is_empty() {
        if !output.quiet {
            println!("{} Nothing to build", status::SUCCESS);
        }
        return Ok(());
    }

    let options = build_options(project.manifest(), args);
    let overwrite = args.overwrite || project.manifest().build.overwrite;
    let output_dir = project.output_dir(args.output.as_deref());
    tracing::info!(
        "{} units to build ({mode}, {}) into {}",
        order.len(),
        options.configuration,
        output_dir.display()
    );

    let toolchain = CommandToolchain::new(project.manifest().toolchain.clone());
    for tool in toolchain.missing_tools() {
        tracing::warn!("`{tool}` was not found on PATH; build steps using it will fail");
    }

    let orchestrator =
        BuildOrchestrator::new(project.graph(), Arc::new(toolchain), PrebakeDirs::new())
            .with_options(options);

    let bar = create_build_bar(order.len() as u64, !output.show_progress());
    let result = orchestrator
        .build_all(&order, &output_dir, overwrite, |event| match event {
            BuildEvent::Started { unit, .. } => bar.set_message(unit.name().to_string()),
            BuildEvent::Finished { .. } => bar.inc(1),
        })
        .await;
    bar.finish_and_clear();

    let outcomes = result.context("Build failed")?;

    if output.json {
        let report: Vec<BundleReport<'_>> = order
            .iter()
            .zip(&outcomes)
            .map(|(unit, outcome)| BundleReport {
                package: unit.package_identity(),
                target: unit.name(),
                path: outcome.path(),
                cached: matches!(outcome, BuildOutcome::Cached(_)),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if !output.quiet {
        for (unit, outcome) in order.iter().zip(&outcomes) {
            match outcome {
                BuildOutcome::Built(path) => {
                    println!("{} {} -> {}", status::SUCCESS, unit, path.display());
                }
                BuildOutcome::Cached(path) => {
                    println!("{} {} up to date ({})", status::CACHED, unit, path.display());
                }
            }
        }
        println!(
            "{} {} bundles in {}",
            status::SUCCESS,
            outcomes.len(),
            output_dir.display()
        );
    }

    Ok(())
}
