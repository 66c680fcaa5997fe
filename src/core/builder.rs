//! Build orchestration logic
//!
//! Builds ordered units one at a time. Inside a unit every SDK is compiled
//! by its own task; assembly waits for all of them and writes the bundle
//! under a temporary name before moving it into place.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinSet;

use crate::core::fingerprint::Fingerprint;
use crate::core::graph::PackageGraph;
use crate::core::manifest::{BuildConfig, Configuration};
use crate::core::planner::{BuildProduct, BuildUnit};
use crate::core::platform::{Platform, Sdk};
use crate::error::{BuildError, BuildStep, FilesystemError, ToolError};
use crate::infra::dirs::PrebakeDirs;
use crate::infra::filesystem;

/// One single-platform build step
#[derive(Debug, Clone)]
pub struct PlatformBuild {
    pub target: String,
    pub package: String,
    pub package_dir: PathBuf,
    pub product: BuildProduct,
    pub sdk: Sdk,
    pub configuration: Configuration,
    /// Build tool working directory for (package, configuration, sdk)
    pub derived_data: PathBuf,
    /// Directory the artifact is written to
    pub products_dir: PathBuf,
    /// Artifact the step must produce
    pub output: PathBuf,
}

/// Single-platform artifact ready for assembly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slice {
    pub sdk: Sdk,
    pub artifact: PathBuf,
    pub symbols: Option<PathBuf>,
}

/// External build tool
///
/// Implementations run the compiler, symbol extractor and bundle assembler.
/// Each call must either produce the requested output path or fail.
#[async_trait]
pub trait Toolchain: Send + Sync {
    /// Compile `request.target` for `request.sdk` into `request.output`
    async fn build_platform(&self, request: &PlatformBuild) -> Result<(), ToolError>;

    /// Extract the debug symbols of a built artifact into `output`
    async fn extract_symbols(&self, request: &PlatformBuild, output: &Path)
        -> Result<(), ToolError>;

    /// Combine every slice into one multi-platform bundle at `output`
    async fn create_bundle(
        &self,
        target: &str,
        slices: &[Slice],
        output: &Path,
    ) -> Result<(), ToolError>;
}

/// Build options shared by every unit of a run
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub configuration: Configuration,
    /// Restricts each package's declared platforms when non-empty
    pub platforms: Vec<Platform>,
    pub include_simulators: bool,
    pub embed_debug_symbols: bool,
    pub bundle_extension: String,
    /// Skip units whose bundle fingerprint matches
    pub cache: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self::from(&BuildConfig::default())
    }
}

impl From<&BuildConfig> for BuildOptions {
    fn from(config: &BuildConfig) -> Self {
        Self {
            configuration: config.configuration,
            platforms: config.platforms.clone(),
            include_simulators: config.simulators,
            embed_debug_symbols: config.embed_debug_symbols,
            bundle_extension: config.bundle_extension.clone(),
            cache: config.cache,
        }
    }
}

/// Result of building one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Bundle was assembled at this path
    Built(PathBuf),
    /// Existing bundle at this path was up to date
    Cached(PathBuf),
}

impl BuildOutcome {
    pub fn path(&self) -> &Path {
        match self {
            BuildOutcome::Built(path) | BuildOutcome::Cached(path) => path,
        }
    }
}

/// Progress notifications from [`BuildOrchestrator::build_all`]
#[derive(Debug)]
pub enum BuildEvent<'a> {
    Started {
        unit: &'a BuildUnit,
        index: usize,
        total: usize,
    },
    Finished {
        unit: &'a BuildUnit,
        outcome: &'a BuildOutcome,
    },
}

/// Build orchestrator state
pub struct BuildOrchestrator<'g> {
    graph: &'g PackageGraph,
    toolchain: Arc<dyn Toolchain>,
    dirs: PrebakeDirs,
    options: BuildOptions,
}

impl<'g> BuildOrchestrator<'g> {
    /// Create a new build orchestrator
    pub fn new(graph: &'g PackageGraph, toolchain: Arc<dyn Toolchain>, dirs: PrebakeDirs) -> Self {
        Self {
            graph,
            toolchain,
            dirs,
            options: BuildOptions::default(),
        }
    }

    /// Set the build options
    #[must_use]
    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    /// SDKs a unit is built for
    pub fn sdks_for(&self, unit: &BuildUnit) -> Vec<Sdk> {
        let declared = &self.graph.package(unit.package()).platforms;
        let restrict = &self.options.platforms;

        let platforms: Vec<Platform> = if restrict.is_empty() {
            declared.clone()
        } else if declared.is_empty() {
            restrict.clone()
        } else {
            declared
                .iter()
                .copied()
                .filter(|p| restrict.contains(p))
                .collect()
        };

        Sdk::for_platforms(&platforms, self.options.include_simulators)
    }

    fn fingerprint(&self, unit: &BuildUnit, sdks: &[Sdk]) -> Fingerprint {
        let package = self.graph.package(unit.package());
        let dependencies: Vec<String> = self
            .graph
            .recursive_dependencies(unit.target())
            .into_iter()
            .map(|target| {
                let dependency = self.graph.package(self.graph.package_of(target));
                let platforms: Vec<String> =
                    dependency.platforms.iter().map(ToString::to_string).collect();
                format!(
                    "{}/{}@{}[{}]",
                    dependency.identity,
                    self.graph.target(target).name,
                    dependency.revision.as_deref().unwrap_or(""),
                    platforms.join(",")
                )
            })
            .collect();

        Fingerprint::compute(
            &package.identity,
            unit.name(),
            package.revision.as_deref(),
            self.options.configuration,
            sdks,
            self.options.embed_debug_symbols,
            &dependencies,
        )
    }

    fn platform_build(&self, unit: &BuildUnit, sdk: Sdk) -> PlatformBuild {
        let package = self.graph.package(unit.package());
        let derived_data =
            self.dirs
                .derived_data_for(&package.identity, self.options.configuration, sdk);
        let products_dir = derived_data.join("Products").join(unit.name());
        let artifact_name = match unit.product() {
            BuildProduct::Framework => format!("{}.framework", unit.name()),
            BuildProduct::Executable => unit.name().to_string(),
        };

        PlatformBuild {
            target: unit.name().to_string(),
            package: package.identity.clone(),
            package_dir: package.path.clone(),
            product: unit.product(),
            sdk,
            configuration: self.options.configuration,
            output: products_dir.join(artifact_name),
            products_dir,
            derived_data,
        }
    }

    /// Build one unit into `<output_dir>/<target>.<ext>`
    ///
    /// Any platform failure aborts the unit before assembly. The final path
    /// only ever holds a complete bundle.
    pub async fn build(
        &self,
        unit: &BuildUnit,
        output_dir: &Path,
        overwrite: bool,
    ) -> Result<BuildOutcome, BuildError> {
        let sdks = self.sdks_for(unit);
        if sdks.is_empty() {
            return Err(BuildError::NoPlatforms {
                package: unit.package_identity().to_string(),
                target: unit.name().to_string(),
            });
        }
        filesystem::create_dir_all_async(output_dir).await?;

        let bundle_name = unit.bundle_file_name(&self.options.bundle_extension);
        let final_path = output_dir.join(&bundle_name);
        let fingerprint = self.fingerprint(unit, &sdks);

        if self.options.cache && fingerprint.matches(&final_path) {
            tracing::info!("{} is up to date, skipping", unit);
            return Ok(BuildOutcome::Cached(final_path));
        }

        tracing::info!(
            "Building {} for {}",
            unit,
            sdks.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
        );

        let slices = self.build_slices(unit, &sdks).await?;

        if final_path.exists() {
            if overwrite {
                tracing::info!("Removing existing bundle {}", final_path.display());
                filesystem::remove_path_async(&final_path).await?;
            } else {
                return Err(BuildError::FilesystemConflict { path: final_path });
            }
        }

        self.assemble(unit, &slices, output_dir, &bundle_name, &fingerprint)
            .await?;

        tracing::info!("Assembled {}", final_path.display());
        Ok(BuildOutcome::Built(final_path))
    }

    /// Run every SDK build concurrently and wait for all of them
    async fn build_slices(&self, unit: &BuildUnit, sdks: &[Sdk]) -> Result<Vec<Slice>, BuildError> {
        let mut join_set = JoinSet::new();
        for sdk in sdks {
            let request = self.platform_build(unit, *sdk);
            let toolchain = Arc::clone(&self.toolchain);
            let embed_symbols = self.options.embed_debug_symbols;
            join_set.spawn(async move { build_platform(toolchain, request, embed_symbols).await });
        }

        let mut slices = Vec::with_capacity(sdks.len());
        while let Some(joined) = join_set.join_next().await {
            let result = match joined {
                Ok(result) => result,
                Err(e) => Err(BuildError::TaskFailed {
                    target: unit.name().to_string(),
                    error: e.to_string(),
                }),
            };
            match result {
                Ok(slice) => slices.push(slice),
                Err(e) => {
                    // Sibling steps are cancelled; their child processes die with them
                    join_set.shutdown().await;
                    tracing::error!("{}", e);
                    return Err(e);
                }
            }
        }

        slices.sort_by_key(|slice| sdks.iter().position(|sdk| *sdk == slice.sdk));
        Ok(slices)
    }

    /// Assemble under a temporary name in `output_dir`, then move into place
    async fn assemble(
        &self,
        unit: &BuildUnit,
        slices: &[Slice],
        output_dir: &Path,
        bundle_name: &str,
        fingerprint: &Fingerprint,
    ) -> Result<(), BuildError> {
        let staging = tempfile::Builder::new()
            .prefix(&format!(".{}-", unit.name()))
            .tempdir_in(output_dir)
            .map_err(|e| FilesystemError::CreateDir {
                path: output_dir.to_path_buf(),
                error: e.to_string(),
            })?;
        let staged = staging.path().join(bundle_name);

        self.toolchain
            .create_bundle(unit.name(), slices, &staged)
            .await
            .map_err(|e| BuildError::tool(unit.name(), "all platforms", BuildStep::Assemble, e))?;

        if !staged.exists() {
            return Err(BuildError::tool(
                unit.name(),
                "all platforms",
                BuildStep::Assemble,
                ToolError::new(None, format!("no bundle was written to {}", staged.display())),
            ));
        }

        fingerprint.write(&staged)?;
        filesystem::rename_async(&staged, &output_dir.join(bundle_name)).await?;
        Ok(())
    }

    /// Build every unit in order, one at a time
    ///
    /// Stops at the first failure; bundles written before it stay on disk.
    pub async fn build_all(
        &self,
        order: &[BuildUnit],
        output_dir: &Path,
        overwrite: bool,
        mut on_event: impl FnMut(BuildEvent<'_>),
    ) -> Result<Vec<BuildOutcome>, BuildError> {
        filesystem::create_dir_all_async(output_dir).await?;

        let mut outcomes = Vec::with_capacity(order.len());
        for (index, unit) in order.iter().enumerate() {
            on_event(BuildEvent::Started {
                unit,
                index,
                total: order.len(),
            });
            let outcome = self.build(unit, output_dir, overwrite).await?;
            on_event(BuildEvent::Finished {
                unit,
                outcome: &outcome,
            });
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }
}

/// Build one SDK slice, extracting symbols afterwards when requested
async fn build_platform(
    toolchain: Arc<dyn Toolchain>,
    request: PlatformBuild,
    embed_symbols: bool,
) -> Result<Slice, BuildError> {
    let platform = request.sdk.to_string();
    let fail = |step, e| BuildError::tool(&request.target, &platform, step, e);

    filesystem::create_dir_all_async(&request.products_dir).await?;
    // A stale artifact would hide a step that silently produced nothing
    filesystem::remove_path_async(&request.output).await?;

    tracing::debug!("Building {} for {}", request.target, platform);
    toolchain
        .build_platform(&request)
        .await
        .map_err(|e| fail(BuildStep::Build, e))?;
    if !request.output.exists() {
        return Err(fail(
            BuildStep::Build,
            ToolError::new(None, format!("{} was not produced", request.output.display())),
        ));
    }

    let symbols = if embed_symbols {
        let output = request
            .products_dir
            .join(format!("{}.dSYM", request.target));
        filesystem::remove_path_async(&output).await?;
        toolchain
            .extract_symbols(&request, &output)
            .await
            .map_err(|e| fail(BuildStep::Symbols, e))?;
        if !output.exists() {
            return Err(fail(
                BuildStep::Symbols,
                ToolError::new(None, format!("{} was not produced", output.display())),
            ));
        }
        Some(output)
    } else {
        None
    };

    Ok(Slice {
        sdk: request.sdk,
        artifact: request.output,
        symbols,
    })
}
