//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod build;
pub mod clean;
pub mod plan;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand, ValueEnum};

use crate::cli::OutputMode;
use crate::core::manifest::Configuration;
use crate::core::planner::RunMode;
use crate::core::platform::Platform;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Prebuild the root package's products and everything they depend on
    Create(BuildArgs),

    /// Prebuild every dependency of the root package's targets
    Prepare(BuildArgs),

    /// Print the build order without building
    Plan {
        /// Which run to plan
        #[arg(short, long, value_enum, default_value_t = ModeArg::Create)]
        mode: ModeArg,

        /// Package graph description (overrides prebake.toml)
        #[arg(short, long)]
        graph: Option<PathBuf>,
    },

    /// Remove build tool working directories
    Clean {
        /// Also remove the output directory
        #[arg(long)]
        all: bool,
    },
}

/// Options shared by `create` and `prepare`
#[derive(Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Package graph description (overrides prebake.toml)
    #[arg(short, long)]
    pub graph: Option<PathBuf>,

    /// Directory the bundles are written to
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Replace bundles that already exist
    #[arg(long)]
    pub overwrite: bool,

    /// Also build simulator slices
    #[arg(long)]
    pub simulators: bool,

    /// Embed debug symbols in each bundle
    #[arg(long)]
    pub embed_debug_symbols: bool,

    /// Build configuration (debug or release)
    #[arg(short, long)]
    pub configuration: Option<Configuration>,

    /// Only build these platforms (comma separated)
    #[arg(short, long, value_delimiter = ',')]
    pub platform: Vec<Platform>,

    /// Skip units whose existing bundle is up to date
    #[arg(long)]
    pub cache: bool,
}

/// Run mode as selected on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    Create,
    Prepare,
}

impl From<ModeArg> for RunMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Create => RunMode::CreatePackage,
            ModeArg::Prepare => RunMode::PrepareDependencies,
        }
    }
}

impl Commands {
    /// Execute the command
    pub async fn run(self, output: OutputMode) -> Result<()> {
        let current_dir = std::env::current_dir()?;
        match self {
            Self::Create(args) => {
                build::execute(&current_dir, RunMode::CreatePackage, &args, output).await
            }
            Self::Prepare(args) => {
                build::execute(&current_dir, RunMode::PrepareDependencies, &args, output).await
            }
            Self::Plan { mode, graph } => {
                plan::execute(&current_dir, mode.into(), graph.as_deref(), output).await
            }
            Self::Clean { all } => clean::execute(&current_dir, all, output).await,
        }
    }
}
