//! Prebake - Prebuilt multi-platform bundles from a package graph
//!
//! This library plans which targets of a package graph have to be compiled,
//! orders them dependencies first, and drives an external toolchain to turn
//! each one into a multi-platform bundle.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Graph model, planner and build orchestration
//! - [`infra`] - Infrastructure layer (filesystem, directories, processes)
//! - [`config`] - Configuration and constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;
