//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output};

use tempfile::TempDir;

/// Test project context
///
/// Creates a temporary directory for test projects and provides
/// utilities for setting up test scenarios.
pub struct TestProject {
    /// Temporary directory for the test project
    pub dir: TempDir,
}

impl TestProject {
    /// Create a new test project in a temporary directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Project with the sample graph and the shell toolchain config
    pub fn sample() -> Self {
        let project = Self::new();
        project.create_file("package-graph.json", SAMPLE_GRAPH);
        project.create_file("prebake.toml", SHELL_TOOLCHAIN);
        project
    }

    /// Get the path to the test project directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Cache directory used instead of the user's
    pub fn cache_dir(&self) -> PathBuf {
        self.dir.path().join(".cache")
    }

    /// Create a file in the test project
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Create a directory in the test project
    pub fn create_dir(&self, name: &str) {
        let path = self.dir.path().join(name);
        std::fs::create_dir_all(path).expect("Failed to create directory");
    }

    /// Check if a file exists in the test project
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    /// Read a file from the test project
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).expect("Failed to read file")
    }

    /// Names of the entries directly inside `dir`
    pub fn list_dir(&self, dir: &str) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.dir.path().join(dir))
            .expect("Failed to read directory")
            .filter_map(Result::ok)
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Run the prebake binary inside the project
    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_prebake"))
            .current_dir(self.dir.path())
            .env("PREBAKE_CACHE_DIR", self.cache_dir())
            .env_remove("RUST_LOG")
            .args(args)
            .output()
            .expect("Failed to execute prebake")
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// App depends on the Core product of a second package.
///
/// `AppTests` and `CoreShims` are excluded kinds, so create mode builds
/// Core then App while prepare mode only builds Core.
pub const SAMPLE_GRAPH: &str = r#"{
    "root_packages": ["app"],
    "packages": [
        {
            "identity": "app",
            "name": "App",
            "path": ".",
            "platforms": ["ios"],
            "targets": [
                { "name": "App", "kind": "library", "dependencies": [
                    { "product": "Core", "package": "core" }
                ]},
                { "name": "AppTests", "kind": "test", "dependencies": [
                    { "target": "App" }
                ]}
            ],
            "products": [{ "name": "App", "targets": ["App"] }]
        },
        {
            "identity": "core",
            "path": "deps/core",
            "platforms": ["ios", "macos"],
            "revision": "1.2.0",
            "targets": [
                { "name": "Core", "kind": "library", "dependencies": [
                    { "target": "CoreShims" }
                ]},
                { "name": "CoreShims", "kind": "systemModule" }
            ],
            "products": [{ "name": "Core", "targets": ["Core"] }]
        }
    ]
}"#;

/// Graph whose two libraries depend on each other
pub const CYCLIC_GRAPH: &str = r#"{
    "root_packages": ["p"],
    "packages": [{
        "identity": "p",
        "platforms": ["ios"],
        "targets": [
            { "name": "A", "kind": "library", "dependencies": [{ "target": "B" }] },
            { "name": "B", "kind": "library", "dependencies": [{ "target": "A" }] }
        ],
        "products": [{ "name": "A", "targets": ["A"] }]
    }]
}"#;

/// Toolchain made of plain shell commands
///
/// The build step writes the SDK name into the framework directory and the
/// assembly step collects those names into `<bundle>/slices`.
pub const SHELL_TOOLCHAIN: &str = r#"
[toolchain]
build = 'mkdir -p {output} && echo {sdk} > {output}/sdk'
symbols = 'mkdir -p {output} && echo {platform} > {output}/origin'
assemble = 'mkdir -p {output} && for s in {slice_paths}; do cat "$s/sdk" >> {output}/slices; done'
"#;
