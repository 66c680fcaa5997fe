//! Project configuration (prebake.toml) parsing
//!
//! Every section is optional; a project without a config file builds with
//! the defaults below.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::defaults;
use crate::core::platform::Platform;
use crate::error::ConfigError;

/// The project configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Manifest {
    /// Package graph source
    #[serde(default)]
    pub graph: GraphConfig,

    /// Build options
    #[serde(default)]
    pub build: BuildConfig,

    /// External tool command templates
    #[serde(default)]
    pub toolchain: ToolchainConfig,
}

/// Where the package graph description comes from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphConfig {
    /// Path to the graph description, relative to the project
    #[serde(default = "default_graph_path")]
    pub path: PathBuf,
}

fn default_graph_path() -> PathBuf {
    PathBuf::from(defaults::DEFAULT_GRAPH_FILE)
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            path: default_graph_path(),
        }
    }
}

/// Build configuration (debug or release)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Configuration {
    Debug,
    #[default]
    Release,
}

impl Configuration {
    /// Name as passed to the build tool
    pub fn setting_name(self) -> &'static str {
        match self {
            Configuration::Debug => "Debug",
            Configuration::Release => "Release",
        }
    }
}

impl std::fmt::Display for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Configuration::Debug => write!(f, "debug"),
            Configuration::Release => write!(f, "release"),
        }
    }
}

impl std::str::FromStr for Configuration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Configuration::Debug),
            "release" => Ok(Configuration::Release),
            other => Err(format!("unknown configuration '{other}' (expected debug or release)")),
        }
    }
}

/// Build options
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuildConfig {
    /// Build configuration
    #[serde(default)]
    pub configuration: Configuration,

    /// Restrict the platforms to build; empty uses each package's declaration
    #[serde(default)]
    pub platforms: Vec<Platform>,

    /// Also build simulator slices
    #[serde(default)]
    pub simulators: bool,

    /// Embed per-platform debug symbols in the bundle
    #[serde(default)]
    pub embed_debug_symbols: bool,

    /// Replace existing bundles instead of failing
    #[serde(default)]
    pub overwrite: bool,

    /// Skip units whose existing bundle has a matching fingerprint
    #[serde(default)]
    pub cache: bool,

    /// Output directory, relative to the project
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Bundle directory extension
    #[serde(default = "default_bundle_extension")]
    pub bundle_extension: String,
}

fn default_output() -> PathBuf {
    PathBuf::from(defaults::DEFAULT_OUTPUT_DIR)
}

fn default_bundle_extension() -> String {
    defaults::DEFAULT_BUNDLE_EXTENSION.to_string()
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            configuration: Configuration::default(),
            platforms: Vec::new(),
            simulators: false,
            embed_debug_symbols: false,
            overwrite: false,
            cache: false,
            output: default_output(),
            bundle_extension: default_bundle_extension(),
        }
    }
}

/// Command templates for the external build tool
///
/// Templates are run with `sh -c` after `{placeholder}` substitution; every
/// substituted value is shell-quoted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolchainConfig {
    #[serde(default = "default_build_command")]
    pub build: String,

    #[serde(default = "default_symbols_command")]
    pub symbols: String,

    #[serde(default = "default_assemble_command")]
    pub assemble: String,
}

fn default_build_command() -> String {
    defaults::DEFAULT_BUILD_COMMAND.to_string()
}

fn default_symbols_command() -> String {
    defaults::DEFAULT_SYMBOLS_COMMAND.to_string()
}

fn default_assemble_command() -> String {
    defaults::DEFAULT_ASSEMBLE_COMMAND.to_string()
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            build: default_build_command(),
            symbols: default_symbols_command(),
            assemble: default_assemble_command(),
        }
    }
}

impl Manifest {
    /// Load the manifest from `path`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        Self::from_toml(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Load `prebake.toml` from a project directory, falling back to defaults
    pub fn load_or_default(project_dir: &Path) -> Result<Self, ConfigError> {
        let path = project_dir.join(defaults::CONFIG_FILE);
        if path.exists() {
            Self::load(&path)
        } else {
            tracing::debug!("No {} found, using defaults", defaults::CONFIG_FILE);
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
