//! Command-line interface module
//!
//! This module handles argument parsing and output formatting.
//! It contains no business logic - that belongs in the [`crate::core`] module.

pub mod commands;
pub mod output;

use anyhow::Result;
use clap::Parser;

use commands::Commands;

/// Prebake - Prebuilt multi-platform bundles from a package graph
///
/// Resolves which targets must be compiled, orders them dependencies first,
/// and assembles one bundle per target.
#[derive(Parser, Debug)]
#[command(name = "prebake")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format for scripting
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// How commands report to the terminal
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputMode {
    pub quiet: bool,
    pub json: bool,
}

impl OutputMode {
    /// Whether progress indicators should be drawn
    pub fn show_progress(self) -> bool {
        !self.quiet && !self.json
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn run(self) -> Result<()> {
        let output = OutputMode {
            quiet: self.quiet,
            json: self.json,
        };
        if let Some(cmd) = self.command {
            cmd.run(output).await
        } else {
            // No subcommand provided, show help
            use clap::CommandFactory;
            let mut cmd = Self::command();
            cmd.print_help()?;
            Ok(())
        }
    }
}
