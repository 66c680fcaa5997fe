//! Core business logic module
//!
//! Planning is pure; the orchestrator reaches the outside world only through
//! the [`builder::Toolchain`] trait and [`crate::infra`].
//!
//! # Submodules
//!
//! - [`graph`] - Package graph model and JSON description
//! - [`platform`] - Platforms and SDKs
//! - [`resolver`] - Generic topological sort with cycle detection
//! - [`planner`] - Build unit selection and ordering
//! - [`builder`] - Build orchestration logic
//! - [`fingerprint`] - Bundle fingerprints for cached runs
//! - [`manifest`] - Project configuration (prebake.toml)
//! - [`project`] - Project loading
//! - [`clean`] - Clean derived data logic

pub mod builder;
pub mod clean;
pub mod fingerprint;
pub mod graph;
pub mod manifest;
pub mod planner;
pub mod platform;
pub mod project;
pub mod resolver;
