//! Integration tests for the prebake binary
//!
//! Runs `create`, `prepare`, `plan` and `clean` against a sample graph with
//! a toolchain made of shell commands, so no platform SDK is needed.

mod common;

use common::{stderr, stdout, TestProject, CYCLIC_GRAPH, SHELL_TOOLCHAIN};

#[test]
fn test_plan_json_lists_create_order() {
    let project = TestProject::sample();

    let output = project.run(&["--json", "plan"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let plan: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let targets: Vec<&str> = plan
        .as_array()
        .unwrap()
        .iter()
        .map(|unit| unit["target"].as_str().unwrap())
        .collect();
    assert_eq!(targets, vec!["Core", "App"]);
    assert_eq!(plan[0]["package"], "core");
    assert_eq!(plan[0]["product"], "framework");
    assert!(plan[0]["sources"]
        .as_str()
        .unwrap()
        .ends_with("deps/core/Sources/Core"));
}

#[test]
fn test_plan_prepare_leaves_out_root_targets() {
    let project = TestProject::sample();

    let output = project.run(&["plan", "--mode", "prepare"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let text = stdout(&output);
    assert!(text.contains("1. Core (core, framework)"));
    assert!(!text.contains("App ("));
}

#[test]
fn test_plan_reports_cycles() {
    let project = TestProject::new();
    project.create_file("package-graph.json", CYCLIC_GRAPH);

    let output = project.run(&["plan"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Dependency cycle detected"));
}

#[test]
fn test_missing_graph_fails_with_path() {
    let project = TestProject::new();

    let output = project.run(&["create"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("package-graph.json"));
}

#[test]
fn test_create_builds_bundles_in_order() {
    let project = TestProject::sample();

    let output = project.run(&["create"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    assert_eq!(
        project.list_dir("prebuilt"),
        vec!["App.xcframework", "Core.xcframework"]
    );
    // Core declares ios and macos, App only ios
    assert_eq!(
        project.read_file("prebuilt/Core.xcframework/slices"),
        "iphoneos\nmacosx\n"
    );
    assert_eq!(
        project.read_file("prebuilt/App.xcframework/slices"),
        "iphoneos\n"
    );
    assert!(project.file_exists("prebuilt/Core.xcframework/.prebake-fingerprint.json"));
    assert!(stdout(&output).contains("2 bundles"));
}

#[test]
fn test_prepare_builds_only_dependencies() {
    let project = TestProject::sample();

    let output = project.run(&["prepare", "--simulators"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    assert_eq!(project.list_dir("prebuilt"), vec!["Core.xcframework"]);
    assert_eq!(
        project.read_file("prebuilt/Core.xcframework/slices"),
        "iphoneos\niphonesimulator\nmacosx\n"
    );
}

#[test]
fn test_existing_bundle_requires_overwrite() {
    let project = TestProject::sample();
    project.create_file("prebuilt/Core.xcframework/old", "previous build");

    let output = project.run(&["prepare"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("already exists"));
    assert_eq!(
        project.read_file("prebuilt/Core.xcframework/old"),
        "previous build"
    );

    let output = project.run(&["prepare", "--overwrite"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(!project.file_exists("prebuilt/Core.xcframework/old"));
    assert!(project.file_exists("prebuilt/Core.xcframework/slices"));
}

#[test]
fn test_cached_run_skips_up_to_date_bundles() {
    let project = TestProject::sample();

    let first = project.run(&["prepare", "--cache"]);
    assert!(first.status.success(), "stderr: {}", stderr(&first));

    let second = project.run(&["prepare", "--cache"]);
    assert!(second.status.success(), "stderr: {}", stderr(&second));
    assert!(stdout(&second).contains("up to date"));

    // A different configuration is a different fingerprint
    let third = project.run(&["prepare", "--cache", "--configuration", "debug"]);
    assert!(!third.status.success());
    assert!(stderr(&third).contains("already exists"));
}

#[test]
fn test_platform_filter_limits_slices() {
    let project = TestProject::sample();

    let output = project.run(&["create", "--platform", "macos"]);
    // App only declares ios, so nothing is left for it
    assert!(!output.status.success());
    assert!(stderr(&output).contains("declares no platforms"));
    assert_eq!(
        project.read_file("prebuilt/Core.xcframework/slices"),
        "macosx\n"
    );
    assert!(!project.file_exists("prebuilt/App.xcframework"));
}

#[test]
fn test_failing_build_step_leaves_no_bundle() {
    let project = TestProject::new();
    project.create_file("package-graph.json", common::SAMPLE_GRAPH);
    project.create_file(
        "prebake.toml",
        &SHELL_TOOLCHAIN.replace(
            "build = 'mkdir",
            "build = 'test {sdk} != macosx || { echo linker exploded >&2; exit 3; }; mkdir",
        ),
    );

    let output = project.run(&["prepare"]);
    assert!(!output.status.success());

    let err = stderr(&output);
    assert!(err.contains("'Core'"));
    assert!(err.contains("macOS"));
    assert!(err.contains("exit status: 3"));
    assert!(err.contains("linker exploded"));
    assert!(project.list_dir("prebuilt").is_empty());
}

#[test]
fn test_json_build_report() {
    let project = TestProject::sample();

    let output = project.run(&["--json", "prepare"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(report[0]["target"], "Core");
    assert_eq!(report[0]["cached"], false);
    assert!(report[0]["path"]
        .as_str()
        .unwrap()
        .ends_with("prebuilt/Core.xcframework"));
}

#[test]
fn test_clean_removes_derived_data() {
    let project = TestProject::sample();
    let build = project.run(&["prepare"]);
    assert!(build.status.success(), "stderr: {}", stderr(&build));
    assert!(project.cache_dir().join("derived-data/core/release/iphoneos").is_dir());

    let output = project.run(&["clean"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(!project.cache_dir().join("derived-data").exists());
    assert!(project.file_exists("prebuilt/Core.xcframework"));

    let output = project.run(&["clean", "--all"]);
    assert!(output.status.success());
    assert!(!project.file_exists("prebuilt"));
}

#[test]
fn test_quiet_create_prints_nothing() {
    let project = TestProject::sample();

    let output = project.run(&["--quiet", "create"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).is_empty());
}
