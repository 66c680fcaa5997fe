//! Project loading
//!
//! A project is a directory with an optional `prebake.toml` and a package
//! graph description. Loading resolves every configured path against the
//! project directory.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::graph::PackageGraph;
use crate::core::manifest::Manifest;
use crate::core::planner::{BuildPlanner, BuildUnit, RunMode};
use crate::error::PrebakeError;

/// A loaded project
#[derive(Debug)]
pub struct Project {
    root: PathBuf,
    manifest: Manifest,
    graph_path: PathBuf,
    graph: PackageGraph,
}

/// Serializable view of one planned unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedUnit {
    pub package: String,
    pub target: String,
    pub product: String,
    /// Source directory of the target
    pub sources: PathBuf,
}

impl Project {
    /// Load the project in `root`
    ///
    /// `graph_override` replaces `[graph] path` from the config file.
    pub fn load(root: &Path, graph_override: Option<&Path>) -> Result<Self, PrebakeError> {
        let manifest = Manifest::load_or_default(root)?;
        let graph_path = resolve(root, graph_override.unwrap_or(&manifest.graph.path));

        tracing::debug!("Loading package graph from {}", graph_path.display());
        let graph = PackageGraph::load(&graph_path)?;

        Ok(Self {
            root: root.to_path_buf(),
            manifest,
            graph_path,
            graph,
        })
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn graph(&self) -> &PackageGraph {
        &self.graph
    }

    pub fn graph_path(&self) -> &Path {
        &self.graph_path
    }

    /// Output directory, resolved against the project root
    pub fn output_dir(&self, output_override: Option<&Path>) -> PathBuf {
        resolve(&self.root, output_override.unwrap_or(&self.manifest.build.output))
    }

    /// Ordered units for a run
    pub fn build_order(&self, mode: RunMode) -> Result<Vec<BuildUnit>, PrebakeError> {
        Ok(BuildPlanner::new(&self.graph, mode).resolve_build_order()?)
    }

    /// Source directory of a unit's target
    ///
    /// Targets without an explicit path follow the `Sources/<name>` layout.
    pub fn source_dir(&self, unit: &BuildUnit) -> PathBuf {
        let package = self.graph.package(unit.package());
        match &self.graph.target(unit.target()).path {
            Some(path) => package.path.join(path),
            None => package.path.join("Sources").join(unit.name()),
        }
    }

    /// Units in order with the details a project generator needs
    pub fn planned_units(&self, order: &[BuildUnit]) -> Vec<PlannedUnit> {
        order
            .iter()
            .map(|unit| PlannedUnit {
                package: unit.package_identity().to_string(),
                target: unit.name().to_string(),
                product: unit.product().as_str().to_string(),
                sources: self.source_dir(unit),
            })
            .collect()
    }
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GraphError, PlannerError};
    use crate::infra::filesystem;
    use tempfile::TempDir;

    const GRAPH: &str = r#"{
        "root_packages": ["app"],
        "packages": [
            {
                "identity": "app",
                "path": ".",
                "platforms": ["ios"],
                "targets": [
                    { "name": "App", "kind": "library", "path": "Code/App",
                      "dependencies": [{ "product": "Core", "package": "core" }] }
                ],
                "products": [{ "name": "App", "targets": ["App"] }]
            },
            {
                "identity": "core",
                "path": "deps/core",
                "targets": [{ "name": "Core", "kind": "library" }],
                "products": [{ "name": "Core", "targets": ["Core"] }]
            }
        ]
    }"#;

    fn project_with(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            filesystem::write_file(&dir.path().join(name), content).unwrap();
        }
        dir
    }

    #[test]
    fn test_load_with_defaults() {
        let dir = project_with(&[("package-graph.json", GRAPH)]);
        let project = Project::load(dir.path(), None).unwrap();

        assert_eq!(project.graph_path(), dir.path().join("package-graph.json"));
        assert_eq!(project.output_dir(None), dir.path().join("prebuilt"));
        assert_eq!(
            project.output_dir(Some(Path::new("/abs/out"))),
            PathBuf::from("/abs/out")
        );
    }

    #[test]
    fn test_config_selects_graph_and_output() {
        let dir = project_with(&[
            ("graphs/main.json", GRAPH),
            (
                "prebake.toml",
                "[graph]\npath = \"graphs/main.json\"\n[build]\noutput = \"out\"\n",
            ),
        ]);
        let project = Project::load(dir.path(), None).unwrap();

        assert_eq!(project.graph_path(), dir.path().join("graphs/main.json"));
        assert_eq!(project.output_dir(None), dir.path().join("out"));
    }

    #[test]
    fn test_missing_graph_is_graph_error() {
        let dir = project_with(&[]);
        let err = Project::load(dir.path(), None).unwrap_err();
        assert!(matches!(err, PrebakeError::Graph(GraphError::Read { .. })));
    }

    #[test]
    fn test_invalid_config_is_config_error() {
        let dir = project_with(&[("package-graph.json", GRAPH), ("prebake.toml", "[build\n")]);
        let err = Project::load(dir.path(), None).unwrap_err();
        assert!(matches!(err, PrebakeError::Config(_)));
    }

    #[test]
    fn test_planned_units_resolve_sources() {
        let dir = project_with(&[("package-graph.json", GRAPH)]);
        let project = Project::load(dir.path(), None).unwrap();
        let order = project.build_order(RunMode::CreatePackage).unwrap();
        let planned = project.planned_units(&order);

        let names: Vec<_> = planned.iter().map(|u| u.target.as_str()).collect();
        assert_eq!(names, vec!["Core", "App"]);
        assert_eq!(
            planned[0].sources,
            dir.path().join("deps/core").join("Sources").join("Core")
        );
        assert_eq!(planned[1].sources, dir.path().join(".").join("Code/App"));
        assert_eq!(planned[1].product, "framework");
    }

    #[test]
    fn test_build_order_surfaces_planner_errors() {
        let dir = project_with(&[("package-graph.json", r#"{ "packages": [] }"#)]);
        let project = Project::load(dir.path(), None).unwrap();
        let err = project.build_order(RunMode::PrepareDependencies).unwrap_err();
        assert!(matches!(
            err,
            PrebakeError::Planner(PlannerError::PackageNotDefined)
        ));
    }
}
