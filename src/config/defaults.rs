//! Default configuration values

/// Project configuration file name
pub const CONFIG_FILE: &str = "prebake.toml";

/// Package graph description written by the graph provider
pub const DEFAULT_GRAPH_FILE: &str = "package-graph.json";

/// Output directory for assembled bundles, relative to the project
pub const DEFAULT_OUTPUT_DIR: &str = "prebuilt";

/// Extension of assembled multi-platform bundles
pub const DEFAULT_BUNDLE_EXTENSION: &str = "xcframework";

/// Fingerprint file stored inside every assembled bundle
pub const FINGERPRINT_FILE: &str = ".prebake-fingerprint.json";

/// Single-platform compile step
pub const DEFAULT_BUILD_COMMAND: &str = "xcodebuild build -scheme {target} -destination {destination} \
-sdk {sdk} -configuration {configuration} -derivedDataPath {derived_data} \
SKIP_INSTALL=NO BUILD_LIBRARY_FOR_DISTRIBUTION=YES CONFIGURATION_BUILD_DIR={products_dir}";

/// Debug symbol extraction step
pub const DEFAULT_SYMBOLS_COMMAND: &str = "dsymutil {artifact}/{target} -o {output}";

/// Multi-platform assembly step
pub const DEFAULT_ASSEMBLE_COMMAND: &str = "xcodebuild -create-xcframework {slices} -output {output}";

/// Minimum proptest iterations
pub const MIN_PROPTEST_ITERATIONS: u32 = 100;
