//! Test utilities for property-based testing
//!
//! This module provides generators and helpers for proptest.

#[cfg(test)]
pub mod generators {
    use proptest::prelude::*;
    use proptest::sample::Index;

    use crate::core::graph::{
        DependencyDescription, GraphDescription, PackageDescription, ProductDescription,
        TargetDescription, TargetKind,
    };
    use crate::core::platform::Platform;

    /// Generate a target kind the planner accepts (buildable or excluded)
    pub fn plannable_kind() -> impl Strategy<Value = TargetKind> {
        prop_oneof![
            4 => Just(TargetKind::Library),
            1 => Just(TargetKind::Executable),
            1 => Just(TargetKind::Test),
            1 => Just(TargetKind::SystemModule),
            1 => Just(TargetKind::Binary),
        ]
    }

    /// Generate a platform list
    pub fn platforms() -> impl Strategy<Value = Vec<Platform>> {
        proptest::sample::subsequence(
            vec![
                Platform::IOS,
                Platform::MacOS,
                Platform::MacCatalyst,
                Platform::TvOS,
                Platform::WatchOS,
                Platform::VisionOS,
            ],
            0..=6,
        )
    }

    /// Generate an acyclic graph description
    ///
    /// Target `T<i>` only depends on targets with a smaller index, either
    /// directly within its package or through the single-target product of
    /// the same name in another package. The last package is the root.
    pub fn acyclic_graph() -> impl Strategy<Value = GraphDescription> {
        (1usize..=4, 1usize..=4)
            .prop_flat_map(|(packages, per_package)| {
                let total = packages * per_package;
                (
                    Just((packages, per_package)),
                    proptest::collection::vec(plannable_kind(), total),
                    proptest::collection::vec(proptest::collection::vec(any::<Index>(), 0..4), total),
                )
            })
            .prop_map(|((packages, per_package), kinds, picks)| {
                describe(packages, per_package, &kinds, &picks)
            })
    }

    fn describe(
        packages: usize,
        per_package: usize,
        kinds: &[TargetKind],
        picks: &[Vec<Index>],
    ) -> GraphDescription {
        let package_of = |target: usize| target / per_package;
        let mut description = GraphDescription {
            root_packages: vec![format!("pkg{}", packages - 1)],
            packages: Vec::with_capacity(packages),
        };

        for p in 0..packages {
            let mut package = PackageDescription {
                identity: format!("pkg{p}"),
                platforms: vec![Platform::IOS],
                ..PackageDescription::default()
            };

            for t in p * per_package..(p + 1) * per_package {
                let mut deps: Vec<usize> = if t == 0 {
                    Vec::new()
                } else {
                    picks[t].iter().map(|pick| pick.index(t)).collect()
                };
                deps.sort_unstable();
                deps.dedup();

                let dependencies = deps
                    .into_iter()
                    .map(|d| {
                        if package_of(d) == p {
                            DependencyDescription::Target {
                                target: format!("T{d}"),
                                condition: None,
                            }
                        } else {
                            DependencyDescription::Product {
                                product: format!("T{d}"),
                                package: Some(format!("pkg{}", package_of(d))),
                                condition: None,
                            }
                        }
                    })
                    .collect();

                package.targets.push(TargetDescription {
                    name: format!("T{t}"),
                    kind: kinds[t],
                    path: None,
                    dependencies,
                });
                package.products.push(ProductDescription {
                    name: format!("T{t}"),
                    targets: vec![format!("T{t}")],
                });
            }

            description.packages.push(package);
        }

        description
    }
}

#[cfg(test)]
mod tests {
    use super::generators::*;
    use crate::config::defaults::MIN_PROPTEST_ITERATIONS;
    use crate::core::graph::PackageGraph;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(MIN_PROPTEST_ITERATIONS))]

        #[test]
        fn test_acyclic_graph_generator_resolves(description in acyclic_graph()) {
            let packages = description.packages.len();
            let graph = PackageGraph::from_description(description);
            prop_assert!(graph.is_ok());
            let graph = graph.unwrap();
            prop_assert_eq!(graph.root_packages().len(), 1);
            prop_assert_eq!(graph.packages().count(), packages);
        }

        #[test]
        fn test_platforms_generator_has_no_duplicates(list in platforms()) {
            let mut deduped = list.clone();
            deduped.dedup();
            prop_assert_eq!(deduped, list);
        }
    }
}
