//! Build planning
//!
//! Decides which targets of the package graph become build units for a run
//! and orders them so every unit comes after the units it depends on.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::core::graph::{PackageGraph, PackageId, TargetId, TargetKind};
use crate::core::resolver::DependencyGraph;
use crate::error::PlannerError;

/// Selects what the root package contributes to a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunMode {
    /// Prebuild the root package's own products (and everything they need)
    CreatePackage,
    /// Prebuild only the dependencies of the root package's targets
    PrepareDependencies,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::CreatePackage => f.write_str("create-package"),
            RunMode::PrepareDependencies => f.write_str("prepare-dependencies"),
        }
    }
}

/// What a buildable target is compiled into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildProduct {
    Framework,
    Executable,
}

impl BuildProduct {
    pub fn as_str(self) -> &'static str {
        match self {
            BuildProduct::Framework => "framework",
            BuildProduct::Executable => "executable",
        }
    }
}

/// How the planner treats a target kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Buildability {
    /// Becomes a build unit producing this product
    Build(BuildProduct),
    /// Never built; treated as a dependency-free leaf
    Excluded,
    /// No buildable mapping exists
    Unsupported,
}

impl TargetKind {
    /// Explicit kind to product mapping
    pub fn buildability(self) -> Buildability {
        match self {
            TargetKind::Library => Buildability::Build(BuildProduct::Framework),
            TargetKind::Executable => Buildability::Build(BuildProduct::Executable),
            TargetKind::Test | TargetKind::SystemModule | TargetKind::Binary => {
                Buildability::Excluded
            }
            TargetKind::Plugin | TargetKind::Snippet => Buildability::Unsupported,
        }
    }
}

/// One schedulable build: a target of a package
///
/// Units are only produced by [`BuildPlanner`]. Identity is the
/// (package, target) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BuildUnit {
    package: PackageId,
    target: TargetId,
    package_identity: String,
    target_name: String,
    product: BuildProduct,
}

impl BuildUnit {
    pub fn package(&self) -> PackageId {
        self.package
    }

    pub fn target(&self) -> TargetId {
        self.target
    }

    pub fn package_identity(&self) -> &str {
        &self.package_identity
    }

    /// Target name, also the bundle's base name
    pub fn name(&self) -> &str {
        &self.target_name
    }

    pub fn product(&self) -> BuildProduct {
        self.product
    }

    /// File name of the assembled bundle
    pub fn bundle_file_name(&self, extension: &str) -> String {
        format!("{}.{extension}", self.target_name)
    }
}

impl fmt::Display for BuildUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.target_name, self.package_identity)
    }
}

/// Computes build units and their order from a package graph
#[derive(Debug, Clone, Copy)]
pub struct BuildPlanner<'g> {
    graph: &'g PackageGraph,
    mode: RunMode,
}

impl<'g> BuildPlanner<'g> {
    pub fn new(graph: &'g PackageGraph, mode: RunMode) -> Self {
        Self { graph, mode }
    }

    fn root_package(&self) -> Result<PackageId, PlannerError> {
        self.graph
            .root_package()
            .ok_or(PlannerError::PackageNotDefined)
    }

    /// Targets whose closures make up the run
    ///
    /// In create mode these are the members of every root product; in
    /// prepare mode every target of the root package, which then only
    /// contributes its dependencies.
    pub fn resolve_targets_to_build(&self) -> Result<Vec<TargetId>, PlannerError> {
        let root = self.graph.package(self.root_package()?);

        let targets = match self.mode {
            RunMode::CreatePackage => {
                let mut seen = HashSet::new();
                let mut targets = Vec::new();
                for product in &root.products {
                    for target in self.graph.targets_of(*product) {
                        if seen.insert(*target) {
                            targets.push(*target);
                        }
                    }
                }
                targets
            }
            RunMode::PrepareDependencies => root.targets.clone(),
        };

        tracing::debug!(
            "{} build roots in package '{}' ({})",
            targets.len(),
            root.identity,
            self.mode
        );
        Ok(targets)
    }

    /// Build unit for a target, `None` if its kind is excluded
    fn unit_for(&self, target: TargetId) -> Result<Option<BuildUnit>, PlannerError> {
        let info = self.graph.target(target);
        match info.kind.buildability() {
            Buildability::Build(product) => Ok(Some(BuildUnit {
                package: info.package,
                target,
                package_identity: self.graph.package(info.package).identity.clone(),
                target_name: info.name.clone(),
                product,
            })),
            Buildability::Excluded => Ok(None),
            Buildability::Unsupported => Err(PlannerError::UnsupportedTargetKind {
                target: info.name.clone(),
                kind: info.kind,
            }),
        }
    }

    /// Units needed to build `root`: its buildable dependency closure
    ///
    /// Create mode includes `root` itself; prepare mode leaves it out. Excluded
    /// kinds are dropped without traversing past them.
    pub fn resolve_build_units(&self, root: TargetId) -> Result<Vec<BuildUnit>, PlannerError> {
        let mut units = Vec::new();

        let root_kind = self.graph.target(root).kind;
        if root_kind.buildability() == Buildability::Excluded {
            return Ok(units);
        }
        if self.mode == RunMode::CreatePackage {
            if let Some(unit) = self.unit_for(root)? {
                units.push(unit);
            }
        }

        let mut seen = HashSet::from([root]);
        let mut stack = self.graph.direct_dependency_targets(root);
        stack.reverse();

        while let Some(target) = stack.pop() {
            if !seen.insert(target) {
                continue;
            }
            if let Some(unit) = self.unit_for(target)? {
                units.push(unit);
                let mut deps = self.graph.direct_dependency_targets(target);
                deps.reverse();
                stack.extend(deps);
            }
        }

        Ok(units)
    }

    /// Every unit of the run, dependencies first
    pub fn resolve_build_order(&self) -> Result<Vec<BuildUnit>, PlannerError> {
        let roots = self.resolve_targets_to_build()?;

        // Union of all closures; a repeated identity replaces the earlier entry
        let mut units: Vec<BuildUnit> = Vec::new();
        let mut index: HashMap<TargetId, usize> = HashMap::new();
        for root in &roots {
            for unit in self.resolve_build_units(*root)? {
                match index.get(&unit.target) {
                    Some(&slot) => units[slot] = unit,
                    None => {
                        index.insert(unit.target, units.len());
                        units.push(unit);
                    }
                }
            }
        }

        check_bundle_names(&units)?;

        // Non-excluded roots stay in the sort even when they are not units so
        // that a cycle through a container target is still reported.
        let mut nodes: HashSet<TargetId> = index.keys().copied().collect();
        let mut graph = DependencyGraph::new();
        for unit in &units {
            graph.add_node_with_dependencies(unit.target, Vec::new());
        }
        for root in &roots {
            if self.graph.target(*root).kind.buildability() != Buildability::Excluded {
                nodes.insert(*root);
                graph.add_node_with_dependencies(*root, Vec::new());
            }
        }
        for node in nodes.iter().copied().collect::<Vec<_>>() {
            let deps: Vec<TargetId> = self
                .graph
                .direct_dependency_targets(node)
                .into_iter()
                .filter(|dep| nodes.contains(dep))
                .collect();
            graph.add_node_with_dependencies(node, deps);
        }

        let sorted = graph.topological_sort().map_err(|cycle| {
            PlannerError::CycleDetected {
                cycle: cycle
                    .path
                    .into_iter()
                    .map(|t| self.graph.target(t).name.clone())
                    .collect(),
            }
        })?;

        let order: Vec<BuildUnit> = sorted
            .into_iter()
            .filter_map(|target| index.get(&target).map(|&slot| units[slot].clone()))
            .collect();

        tracing::info!(
            "Resolved {} build units ({})",
            order.len(),
            self.mode
        );
        Ok(order)
    }
}

fn check_bundle_names(units: &[BuildUnit]) -> Result<(), PlannerError> {
    let mut names: HashMap<&str, &BuildUnit> = HashMap::new();
    for unit in units {
        if let Some(existing) = names.insert(unit.name(), unit) {
            if existing.package != unit.package {
                return Err(PlannerError::BundleNameCollision {
                    name: unit.name().to_string(),
                    first: existing.package_identity.clone(),
                    second: unit.package_identity.clone(),
                });
            }
        }
    }
    Ok(())
}
