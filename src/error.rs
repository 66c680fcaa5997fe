//! Error types for prebake
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

use crate::core::graph::TargetKind;

/// Graph description loading errors
#[derive(Error, Debug)]
pub enum GraphError {
    /// Failed to read the description file
    #[error("Failed to read package graph '{path}': {error}")]
    Read { path: PathBuf, error: String },

    /// Description is not valid JSON or has the wrong shape
    #[error("Failed to parse package graph: {0}")]
    Parse(String),

    /// Two packages share one identity
    #[error("Package '{identity}' is declared more than once")]
    DuplicatePackage { identity: String },

    /// Two targets of one package share a name
    #[error("Target '{target}' is declared more than once in package '{package}'")]
    DuplicateTarget { package: String, target: String },

    /// Two products of one package share a name
    #[error("Product '{product}' is declared more than once in package '{package}'")]
    DuplicateProduct { package: String, product: String },

    /// A root package name does not match any package
    #[error("Root package '{identity}' is not declared in the graph")]
    UnknownRootPackage { identity: String },

    /// A target dependency names a target that does not exist
    #[error("Target '{target}' depends on unknown target '{dependency}'")]
    UnknownTarget { target: String, dependency: String },

    /// A product dependency names a product that does not exist
    #[error("Target '{target}' depends on unknown product '{product}'")]
    UnknownProduct { target: String, product: String },

    /// A product lists a member target that does not exist
    #[error("Product '{product}' of package '{package}' lists unknown target '{target}'")]
    UnknownProductMember {
        package: String,
        product: String,
        target: String,
    },
}

/// Build planning errors
///
/// All of these are fatal for the run: the graph violates an invariant the
/// planner relies on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlannerError {
    /// The graph has no root package
    #[error("No root package is defined in the package graph")]
    PackageNotDefined,

    /// Dependency cycle between build units
    #[error("Dependency cycle detected: {}", cycle.join(" -> "))]
    CycleDetected { cycle: Vec<String> },

    /// Target kind with no buildable mapping
    #[error("Target '{target}' has kind '{kind}' which cannot be prebuilt")]
    UnsupportedTargetKind { target: String, kind: TargetKind },

    /// Two distinct units would write the same bundle
    #[error("Target name '{name}' is defined by both '{first}' and '{second}'; bundle names must be unique")]
    BundleNameCollision {
        name: String,
        first: String,
        second: String,
    },
}

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to remove directory
    #[error("Failed to remove directory '{path}': {error}")]
    RemoveDir { path: PathBuf, error: String },

    /// Failed to move a directory into place
    #[error("Failed to move '{from}' to '{to}': {error}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        error: String,
    },

    /// Failed to write file
    #[error("Failed to write file '{path}': {error}")]
    WriteFile { path: PathBuf, error: String },

    /// Failed to read file
    #[error("Failed to read file '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },
}

/// Which external step of a unit build failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStep {
    /// Single-platform compile
    Build,
    /// Debug symbol extraction
    Symbols,
    /// Multi-platform bundle assembly
    Assemble,
}

impl std::fmt::Display for BuildStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildStep::Build => write!(f, "build"),
            BuildStep::Symbols => write!(f, "symbol extraction"),
            BuildStep::Assemble => write!(f, "assembly"),
        }
    }
}

/// Failure reported by an external tool invocation
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ToolError {
    /// Exit status of the process, if it ran and exited
    pub exit_status: Option<i32>,
    /// Human readable detail (command, stderr tail)
    pub message: String,
}

impl ToolError {
    /// Create a tool error from a message
    pub fn new(exit_status: Option<i32>, message: impl Into<String>) -> Self {
        Self {
            exit_status,
            message: message.into(),
        }
    }
}

/// Build errors
#[derive(Error, Debug)]
pub enum BuildError {
    /// External tool failed for one platform of one unit
    #[error("{step} of '{target}' for {platform} failed (exit status: {}): {error}", status_text(exit_status))]
    ToolFailure {
        target: String,
        platform: String,
        step: BuildStep,
        exit_status: Option<i32>,
        error: String,
    },

    /// Bundle already exists and overwrite was not requested
    #[error("Bundle already exists at '{path}'. Use --overwrite to replace it")]
    FilesystemConflict { path: PathBuf },

    /// Unit has no platforms to build for
    #[error("Package '{package}' declares no platforms to build '{target}' for")]
    NoPlatforms { package: String, target: String },

    /// A platform task panicked or was cancelled
    #[error("Platform task for '{target}' did not complete: {error}")]
    TaskFailed { target: String, error: String },

    /// Filesystem error while staging or moving a bundle
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
}

impl BuildError {
    /// Wrap a tool error with the unit/platform/step that produced it
    pub fn tool(target: &str, platform: &str, step: BuildStep, err: ToolError) -> Self {
        BuildError::ToolFailure {
            target: target.to_string(),
            platform: platform.to_string(),
            step,
            exit_status: err.exit_status,
            error: err.message,
        }
    }
}

fn status_text(status: &Option<i32>) -> String {
    status.map_or_else(|| "none".to_string(), |code| code.to_string())
}

/// Project configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file '{path}': {error}")]
    Read { path: PathBuf, error: String },

    /// Failed to parse config file
    #[error("Failed to parse config file '{path}': {error}")]
    Parse { path: PathBuf, error: String },
}

/// Top-level prebake error type
#[derive(Error, Debug)]
pub enum PrebakeError {
    /// Graph error
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Planner error
    #[error("Planner error: {0}")]
    Planner(#[from] PlannerError),

    /// Build error
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// Config error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Filesystem error
    #[error("Filesystem error: {0}")]
    Filesystem(#[from] FilesystemError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_failure_names_unit_platform_and_status() {
        let err = BuildError::tool(
            "Core",
            "iOS Simulator",
            BuildStep::Build,
            ToolError::new(Some(65), "xcodebuild exited"),
        );
        let msg = err.to_string();
        assert!(msg.contains("Core"));
        assert!(msg.contains("iOS Simulator"));
        assert!(msg.contains("65"));
        assert!(msg.starts_with("build of"));
    }

    #[test]
    fn test_cycle_message_joins_path() {
        let err = PlannerError::CycleDetected {
            cycle: vec!["A".into(), "B".into(), "A".into()],
        };
        assert_eq!(err.to_string(), "Dependency cycle detected: A -> B -> A");
    }

    #[test]
    fn test_unsupported_kind_message() {
        let err = PlannerError::UnsupportedTargetKind {
            target: "Lint".into(),
            kind: TargetKind::Plugin,
        };
        assert!(err.to_string().contains("plugin"));
    }
}
