//! Platform-specific directory management
//!
//! Provides the cache directory that holds the build tool's derived data.
//! The derived-data tree is shared by every unit of a run and keyed by
//! (package, configuration, sdk).
//!
//! Environment variables can override default directories:
//! - `PREBAKE_CACHE_DIR` - Override cache directory

use std::env;
use std::path::{Path, PathBuf};

use crate::core::manifest::Configuration;
use crate::core::platform::Sdk;

/// Environment variable name for the cache directory override
pub const ENV_CACHE_DIR: &str = "PREBAKE_CACHE_DIR";

/// Application name used in directory paths
const APP_NAME: &str = "prebake";

/// Subdirectory for build tool working directories
const DERIVED_DATA_SUBDIR: &str = "derived-data";

/// Directory provider for prebake
#[derive(Debug, Clone)]
pub struct PrebakeDirs {
    cache_dir: PathBuf,
}

impl PrebakeDirs {
    /// Create a new `PrebakeDirs` instance
    ///
    /// Checks environment variables first, then falls back to platform defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache_dir: Self::resolve_cache_dir(),
        }
    }

    /// Use an explicit cache directory
    #[must_use]
    pub fn with_cache_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Get the cache directory path
    ///
    /// - Linux: `$XDG_CACHE_HOME/prebake` or `~/.cache/prebake`
    /// - macOS: `~/Library/Caches/prebake`
    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Root of all build tool working directories
    #[must_use]
    pub fn derived_data_dir(&self) -> PathBuf {
        self.cache_dir.join(DERIVED_DATA_SUBDIR)
    }

    /// Working directory for one package, configuration and SDK
    #[must_use]
    pub fn derived_data_for(
        &self,
        package: &str,
        configuration: Configuration,
        sdk: Sdk,
    ) -> PathBuf {
        self.derived_data_dir()
            .join(package)
            .join(configuration.to_string())
            .join(sdk.slug())
    }

    /// Resolve cache directory from environment or platform default
    fn resolve_cache_dir() -> PathBuf {
        if let Ok(path) = env::var(ENV_CACHE_DIR) {
            return PathBuf::from(path);
        }

        Self::platform_cache_dir()
    }

    /// Get platform-specific cache directory
    fn platform_cache_dir() -> PathBuf {
        dirs::cache_dir()
            .map(|p| p.join(APP_NAME))
            .unwrap_or_else(|| {
                // Fallback to home directory
                dirs::home_dir()
                    .map(|h| h.join(".cache").join(APP_NAME))
                    .unwrap_or_else(|| PathBuf::from(".").join(".cache").join(APP_NAME))
            })
    }
}

impl Default for PrebakeDirs {
    fn default() -> Self {
        Self::new()
    }
}
