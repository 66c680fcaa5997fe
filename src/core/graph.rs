//! Package graph model
//!
//! The graph is produced by an external package-graph provider as a JSON
//! description and loaded once per run. Packages, targets and products are
//! stored in flat tables and refer to each other through typed index ids, so
//! the mutually-referencing structure never needs owning back-references.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::platform::Platform;
use crate::error::GraphError;

/// Index of a package in [`PackageGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId(usize);

/// Index of a target in [`PackageGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(usize);

/// Index of a product in [`PackageGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductId(usize);

/// Kind of a compilable target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetKind {
    Library,
    Executable,
    Test,
    SystemModule,
    Binary,
    Plugin,
    Snippet,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TargetKind::Library => "library",
            TargetKind::Executable => "executable",
            TargetKind::Test => "test",
            TargetKind::SystemModule => "systemModule",
            TargetKind::Binary => "binary",
            TargetKind::Plugin => "plugin",
            TargetKind::Snippet => "snippet",
        };
        f.write_str(name)
    }
}

/// Platform condition attached to a dependency edge
///
/// Conditions are recorded but never narrow resolution: a conditional
/// dependency is built for every platform of the unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    /// Platforms the dependency applies to
    #[serde(default)]
    pub platforms: Vec<String>,
}

/// Resolved dependency edge of a target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
    /// Edge to another target
    Target {
        target: TargetId,
        condition: Option<Condition>,
    },
    /// Edge to a product, fanning out to every member target
    Product {
        product: ProductId,
        condition: Option<Condition>,
    },
}

/// A named source unit with a root directory
#[derive(Debug, Clone)]
pub struct Package {
    /// Stable identity (e.g. lowercased repository name)
    pub identity: String,
    /// Display name
    pub name: String,
    /// Package root directory
    pub path: PathBuf,
    /// Declared supported platforms
    pub platforms: Vec<Platform>,
    /// Resolved revision or version, if the provider knows it
    pub revision: Option<String>,
    /// Targets owned by this package
    pub targets: Vec<TargetId>,
    /// Products exposed by this package
    pub products: Vec<ProductId>,
}

/// A compilable unit of a package
#[derive(Debug, Clone)]
pub struct Target {
    pub name: String,
    pub kind: TargetKind,
    pub package: PackageId,
    /// Source directory relative to the package root
    pub path: Option<PathBuf>,
    pub dependencies: Vec<Dependency>,
}

/// A named export surface of a package
#[derive(Debug, Clone)]
pub struct Product {
    pub name: String,
    pub package: PackageId,
    pub targets: Vec<TargetId>,
}

/// Immutable package graph for one run
#[derive(Debug, Clone, Default)]
pub struct PackageGraph {
    packages: Vec<Package>,
    targets: Vec<Target>,
    products: Vec<Product>,
    root_packages: Vec<PackageId>,
}

impl PackageGraph {
    /// Load a graph description from a JSON file
    ///
    /// Relative package paths are taken relative to the file's directory.
    pub fn load(path: &Path) -> Result<Self, GraphError> {
        let content = std::fs::read_to_string(path).map_err(|e| GraphError::Read {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        let mut description: GraphDescription =
            serde_json::from_str(&content).map_err(|e| GraphError::Parse(e.to_string()))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        for package in &mut description.packages {
            if package.path.is_relative() {
                package.path = base.join(&package.path);
            }
        }
        Self::from_description(description)
    }

    /// Parse a graph description from JSON
    pub fn from_json(content: &str) -> Result<Self, GraphError> {
        let description: GraphDescription =
            serde_json::from_str(content).map_err(|e| GraphError::Parse(e.to_string()))?;
        Self::from_description(description)
    }

    /// Resolve a name-based description into the id-based graph
    pub fn from_description(description: GraphDescription) -> Result<Self, GraphError> {
        let mut graph = PackageGraph::default();
        let mut package_index: HashMap<String, PackageId> = HashMap::new();
        // (package, target name) -> id
        let mut target_index: HashMap<(PackageId, String), TargetId> = HashMap::new();
        let mut product_index: HashMap<(PackageId, String), ProductId> = HashMap::new();

        // First pass: allocate ids for packages and targets
        for desc in &description.packages {
            if package_index.contains_key(&desc.identity) {
                return Err(GraphError::DuplicatePackage {
                    identity: desc.identity.clone(),
                });
            }
            let package_id = PackageId(graph.packages.len());
            package_index.insert(desc.identity.clone(), package_id);

            let mut targets = Vec::with_capacity(desc.targets.len());
            for target in &desc.targets {
                let target_id = TargetId(graph.targets.len());
                if target_index
                    .insert((package_id, target.name.clone()), target_id)
                    .is_some()
                {
                    return Err(GraphError::DuplicateTarget {
                        package: desc.identity.clone(),
                        target: target.name.clone(),
                    });
                }
                graph.targets.push(Target {
                    name: target.name.clone(),
                    kind: target.kind,
                    package: package_id,
                    path: target.path.clone(),
                    dependencies: Vec::new(),
                });
                targets.push(target_id);
            }

            graph.packages.push(Package {
                identity: desc.identity.clone(),
                name: desc.name.clone().unwrap_or_else(|| desc.identity.clone()),
                path: desc.path.clone(),
                platforms: desc.platforms.clone(),
                revision: desc.revision.clone(),
                targets,
                products: Vec::new(),
            });
        }

        // Second pass: products, which only reference targets of their package
        for (desc, package_id) in description.packages.iter().zip(0..) {
            let package_id = PackageId(package_id);
            for product in &desc.products {
                let mut members = Vec::with_capacity(product.targets.len());
                for member in &product.targets {
                    let target_id = target_index
                        .get(&(package_id, member.clone()))
                        .copied()
                        .ok_or_else(|| GraphError::UnknownProductMember {
                            package: desc.identity.clone(),
                            product: product.name.clone(),
                            target: member.clone(),
                        })?;
                    members.push(target_id);
                }
                let product_id = ProductId(graph.products.len());
                if product_index
                    .insert((package_id, product.name.clone()), product_id)
                    .is_some()
                {
                    return Err(GraphError::DuplicateProduct {
                        package: desc.identity.clone(),
                        product: product.name.clone(),
                    });
                }
                graph.products.push(Product {
                    name: product.name.clone(),
                    package: package_id,
                    targets: members,
                });
                graph.packages[package_id.0].products.push(product_id);
            }
        }

        // Third pass: dependency edges
        for (desc, package_id) in description.packages.iter().zip(0..) {
            let package_id = PackageId(package_id);
            for target in &desc.targets {
                let target_id = target_index[&(package_id, target.name.clone())];
                let mut dependencies = Vec::with_capacity(target.dependencies.len());
                for dep in &target.dependencies {
                    let resolved = match dep {
                        DependencyDescription::Target { target: name, condition } => {
                            let id = target_index
                                .get(&(package_id, name.clone()))
                                .copied()
                                .ok_or_else(|| GraphError::UnknownTarget {
                                    target: target.name.clone(),
                                    dependency: name.clone(),
                                })?;
                            Dependency::Target {
                                target: id,
                                condition: condition.clone(),
                            }
                        }
                        DependencyDescription::Product {
                            product,
                            package,
                            condition,
                        } => {
                            let id = lookup_product(
                                &package_index,
                                &product_index,
                                package_id,
                                package.as_deref(),
                                product,
                            )
                            .ok_or_else(|| GraphError::UnknownProduct {
                                target: target.name.clone(),
                                product: product.clone(),
                            })?;
                            Dependency::Product {
                                product: id,
                                condition: condition.clone(),
                            }
                        }
                    };
                    dependencies.push(resolved);
                }
                graph.targets[target_id.0].dependencies = dependencies;
            }
        }

        for identity in &description.root_packages {
            let id = package_index.get(identity).copied().ok_or_else(|| {
                GraphError::UnknownRootPackage {
                    identity: identity.clone(),
                }
            })?;
            graph.root_packages.push(id);
        }

        tracing::debug!(
            "Loaded package graph: {} packages, {} targets, {} products",
            graph.packages.len(),
            graph.targets.len(),
            graph.products.len()
        );

        Ok(graph)
    }

    /// The root package, if the provider declared one
    pub fn root_package(&self) -> Option<PackageId> {
        self.root_packages.first().copied()
    }

    /// All root packages in declaration order
    pub fn root_packages(&self) -> &[PackageId] {
        &self.root_packages
    }

    pub fn package(&self, id: PackageId) -> &Package {
        &self.packages[id.0]
    }

    pub fn target(&self, id: TargetId) -> &Target {
        &self.targets[id.0]
    }

    pub fn product(&self, id: ProductId) -> &Product {
        &self.products[id.0]
    }

    /// Package owning a target
    pub fn package_of(&self, target: TargetId) -> PackageId {
        self.target(target).package
    }

    /// Member targets of a product
    pub fn targets_of(&self, product: ProductId) -> &[TargetId] {
        &self.product(product).targets
    }

    /// Direct dependency edges of a target
    pub fn dependencies_of(&self, target: TargetId) -> &[Dependency] {
        &self.target(target).dependencies
    }

    /// Direct dependency targets, with product edges fanned out to members
    pub fn direct_dependency_targets(&self, target: TargetId) -> Vec<TargetId> {
        let mut result = Vec::new();
        for dep in self.dependencies_of(target) {
            match dep {
                Dependency::Target { target, .. } => result.push(*target),
                Dependency::Product { product, .. } => {
                    result.extend_from_slice(self.targets_of(*product));
                }
            }
        }
        result
    }

    /// Every target reachable from `target`, excluding itself, in discovery order
    pub fn recursive_dependencies(&self, target: TargetId) -> Vec<TargetId> {
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        let mut stack = self.direct_dependency_targets(target);
        stack.reverse();
        while let Some(next) = stack.pop() {
            if next == target || !seen.insert(next) {
                continue;
            }
            result.push(next);
            let mut deps = self.direct_dependency_targets(next);
            deps.reverse();
            stack.extend(deps);
        }
        result
    }

    /// Look up a target by package identity and name
    pub fn find_target(&self, package: &str, name: &str) -> Option<TargetId> {
        let package = self.packages.iter().find(|p| p.identity == package)?;
        package
            .targets
            .iter()
            .copied()
            .find(|id| self.target(*id).name == name)
    }

    pub fn packages(&self) -> impl Iterator<Item = (PackageId, &Package)> {
        self.packages
            .iter()
            .enumerate()
            .map(|(i, p)| (PackageId(i), p))
    }
}

fn lookup_product(
    package_index: &HashMap<String, PackageId>,
    product_index: &HashMap<(PackageId, String), ProductId>,
    current: PackageId,
    package: Option<&str>,
    product: &str,
) -> Option<ProductId> {
    if let Some(identity) = package {
        let package_id = package_index.get(identity)?;
        return product_index.get(&(*package_id, product.to_string())).copied();
    }

    // Unqualified: own package first, then the first package exporting it
    if let Some(id) = product_index.get(&(current, product.to_string())) {
        return Some(*id);
    }
    product_index
        .iter()
        .filter(|((_, name), _)| name == product)
        .map(|(_, id)| *id)
        .min()
}

/// Name-based graph description as written by the package-graph provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphDescription {
    /// Identities of the root packages; the first one drives the run
    #[serde(default)]
    pub root_packages: Vec<String>,

    #[serde(default)]
    pub packages: Vec<PackageDescription>,
}

/// Package entry of a [`GraphDescription`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageDescription {
    pub identity: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub path: PathBuf,

    #[serde(default)]
    pub platforms: Vec<Platform>,

    #[serde(default)]
    pub revision: Option<String>,

    #[serde(default)]
    pub targets: Vec<TargetDescription>,

    #[serde(default)]
    pub products: Vec<ProductDescription>,
}

/// Target entry of a [`PackageDescription`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetDescription {
    pub name: String,

    pub kind: TargetKind,

    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default)]
    pub dependencies: Vec<DependencyDescription>,
}

/// Dependency entry of a [`TargetDescription`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencyDescription {
    /// `{ "target": "Name" }`, always within the same package
    Target {
        target: String,
        #[serde(default)]
        condition: Option<Condition>,
    },
    /// `{ "product": "Name", "package": "identity" }`
    Product {
        product: String,
        #[serde(default)]
        package: Option<String>,
        #[serde(default)]
        condition: Option<Condition>,
    },
}

/// Product entry of a [`PackageDescription`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDescription {
    pub name: String,
    pub targets: Vec<String>,
}
