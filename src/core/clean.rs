//! Clean logic
//!
//! Removes the shared derived-data directory and, on request, the bundles
//! written to the output directory.

use std::path::{Path, PathBuf};

use crate::error::FilesystemError;
use crate::infra::dirs::PrebakeDirs;
use crate::infra::filesystem;

/// Result of clean operation
#[derive(Debug, Default)]
pub struct CleanResult {
    /// Directories that were removed
    pub removed: Vec<PathBuf>,
    /// Directories that didn't exist (skipped)
    pub skipped: Vec<PathBuf>,
    /// Bytes of files removed
    pub bytes_freed: u64,
}

impl CleanResult {
    /// Format freed size for display
    pub fn format_size(&self) -> String {
        let bytes = self.bytes_freed;
        if bytes < 1024 {
            format!("{bytes} bytes")
        } else if bytes < 1024 * 1024 {
            format!("{:.1} KB", bytes as f64 / 1024.0)
        } else if bytes < 1024 * 1024 * 1024 {
            format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
        } else {
            format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
        }
    }
}

/// Remove build tool working directories, plus `output_dir` if given
pub fn clean(dirs: &PrebakeDirs, output_dir: Option<&Path>) -> Result<CleanResult, FilesystemError> {
    let mut result = CleanResult::default();

    let mut targets = vec![dirs.derived_data_dir()];
    if let Some(output) = output_dir {
        targets.push(output.to_path_buf());
    }

    for dir in targets {
        if dir.exists() {
            result.bytes_freed += filesystem::dir_size(&dir);
            filesystem::remove_dir_all(&dir)?;
            tracing::info!("Removed {}", dir.display());
            result.removed.push(dir);
        } else {
            result.skipped.push(dir);
        }
    }

    Ok(result)
}
