//! Bundle fingerprints
//!
//! Every assembled bundle carries a small JSON file describing the inputs it
//! was built from. When caching is enabled a unit whose existing bundle has
//! the same fingerprint is not rebuilt. The key also covers every target the
//! unit depends on, so bumping a dependency invalidates its dependents.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::defaults::FINGERPRINT_FILE;
use crate::core::manifest::Configuration;
use crate::core::platform::Sdk;
use crate::error::FilesystemError;
use crate::infra::filesystem;

/// Build inputs of one bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub package: String,
    pub target: String,
    pub revision: Option<String>,
    /// SHA256 over every input, hex encoded
    pub key: String,
}

impl Fingerprint {
    /// Compute the fingerprint for a unit build
    ///
    /// `dependencies` describes every target the unit reaches, one string per
    /// target, in a stable order.
    pub fn compute(
        package: &str,
        target: &str,
        revision: Option<&str>,
        configuration: Configuration,
        sdks: &[Sdk],
        embed_debug_symbols: bool,
        dependencies: &[String],
    ) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(package.as_bytes());
        hasher.update([0]);
        hasher.update(target.as_bytes());
        hasher.update([0]);
        hasher.update(revision.unwrap_or("").as_bytes());
        hasher.update([0]);
        hasher.update(configuration.setting_name().as_bytes());
        for sdk in sdks {
            hasher.update([0]);
            hasher.update(sdk.slug().as_bytes());
        }
        hasher.update([u8::from(embed_debug_symbols)]);
        for dependency in dependencies {
            hasher.update([0]);
            hasher.update(dependency.as_bytes());
        }

        Self {
            package: package.to_string(),
            target: target.to_string(),
            revision: revision.map(str::to_string),
            key: hex::encode(hasher.finalize()),
        }
    }

    /// Read the fingerprint stored in a bundle, if any
    pub fn read(bundle: &Path) -> Option<Self> {
        let content = filesystem::read_file(&bundle.join(FINGERPRINT_FILE)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Store the fingerprint inside a bundle
    pub fn write(&self, bundle: &Path) -> Result<(), FilesystemError> {
        let path = bundle.join(FINGERPRINT_FILE);
        let content =
            serde_json::to_string_pretty(self).map_err(|e| FilesystemError::WriteFile {
                path: path.clone(),
                error: e.to_string(),
            })?;
        filesystem::write_file(&path, &content)
    }

    /// Whether `bundle` exists and was built from the same inputs
    pub fn matches(&self, bundle: &Path) -> bool {
        Self::read(bundle).is_some_and(|stored| stored.key == self.key)
    }
}
