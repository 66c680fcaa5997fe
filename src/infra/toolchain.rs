//! Command-template toolchain
//!
//! Runs the configured build, symbol and assembly commands through `sh -c`.
//! Templates reference `{placeholders}` that are replaced by shell-quoted
//! values; the same values are exported as `PREBAKE_*` environment variables.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::core::builder::{PlatformBuild, Slice, Toolchain};
use crate::core::manifest::ToolchainConfig;
use crate::error::ToolError;

/// Lines of stderr kept in a failure message
const STDERR_TAIL_LINES: usize = 20;

/// Toolchain driven by shell command templates
#[derive(Debug, Clone)]
pub struct CommandToolchain {
    config: ToolchainConfig,
}

impl CommandToolchain {
    pub fn new(config: ToolchainConfig) -> Self {
        Self { config }
    }

    /// Programs named by the templates that are not on `PATH`
    ///
    /// Only the first word of each template is checked, so shell builtins
    /// and compound commands may be reported; callers treat this as advice.
    pub fn missing_tools(&self) -> Vec<String> {
        let mut missing = Vec::new();
        for template in [&self.config.build, &self.config.symbols, &self.config.assemble] {
            if let Some(program) = template.split_whitespace().next() {
                if which::which(program).is_err() && !missing.iter().any(|m| m == program) {
                    missing.push(program.to_string());
                }
            }
        }
        missing
    }

    async fn run(
        &self,
        template: &str,
        vars: &[(&str, String)],
        raw: &[(&str, String)],
        cwd: Option<&Path>,
    ) -> Result<(), ToolError> {
        let command_line = render_template(template, vars, raw);
        tracing::debug!("Running: {command_line}");

        let mut command = Command::new("sh");
        command
            .arg("-c")
            .arg(&command_line)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        for (name, value) in vars {
            command.env(format!("PREBAKE_{}", name.to_uppercase()), value);
        }
        if let Some(dir) = cwd.filter(|dir| dir.is_dir()) {
            command.current_dir(dir);
        }

        let output = command
            .output()
            .await
            .map_err(|e| ToolError::new(None, format!("failed to spawn `{command_line}`: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            if !stdout.is_empty() {
                tracing::debug!("stdout: {stdout}");
            }
            return Err(ToolError::new(
                output.status.code(),
                format!("`{command_line}` failed\n{}", tail(&stderr, STDERR_TAIL_LINES)),
            ));
        }

        Ok(())
    }
}

fn platform_vars(request: &PlatformBuild) -> Vec<(&'static str, String)> {
    vec![
        ("target", request.target.clone()),
        ("package", request.package.clone()),
        ("package_dir", request.package_dir.display().to_string()),
        ("product", request.product.as_str().to_string()),
        ("platform", request.sdk.to_string()),
        ("sdk", request.sdk.settings_name().to_string()),
        ("destination", request.sdk.destination().to_string()),
        (
            "configuration",
            request.configuration.setting_name().to_string(),
        ),
        ("derived_data", request.derived_data.display().to_string()),
        ("products_dir", request.products_dir.display().to_string()),
    ]
}

#[async_trait]
impl Toolchain for CommandToolchain {
    async fn build_platform(&self, request: &PlatformBuild) -> Result<(), ToolError> {
        let mut vars = platform_vars(request);
        vars.push(("output", request.output.display().to_string()));
        self.run(&self.config.build, &vars, &[], Some(request.package_dir.as_path()))
            .await
    }

    async fn extract_symbols(
        &self,
        request: &PlatformBuild,
        output: &Path,
    ) -> Result<(), ToolError> {
        let mut vars = platform_vars(request);
        vars.push(("artifact", request.output.display().to_string()));
        vars.push(("output", output.display().to_string()));
        self.run(&self.config.symbols, &vars, &[], Some(request.package_dir.as_path()))
            .await
    }

    async fn create_bundle(
        &self,
        target: &str,
        slices: &[Slice],
        output: &Path,
    ) -> Result<(), ToolError> {
        let vars = [
            ("target", target.to_string()),
            ("output", output.display().to_string()),
        ];

        let mut flags = Vec::new();
        let mut artifacts = Vec::new();
        let mut symbols = Vec::new();
        for slice in slices {
            let artifact = shell_quote(&slice.artifact.display().to_string());
            flags.push(format!("-framework {artifact}"));
            artifacts.push(artifact);
            if let Some(path) = &slice.symbols {
                let path = shell_quote(&path.display().to_string());
                flags.push(format!("-debug-symbols {path}"));
                symbols.push(path);
            }
        }
        let raw = [
            ("slices", flags.join(" ")),
            ("slice_paths", artifacts.join(" ")),
            ("symbol_paths", symbols.join(" ")),
        ];

        self.run(&self.config.assemble, &vars, &raw, None).await
    }
}

/// Quote a value for POSIX `sh`
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Replace `{name}` placeholders
///
/// `vars` values are shell-quoted, `raw` values are inserted verbatim.
/// Unknown placeholders (including `${VAR}` shell syntax) are left untouched.
pub fn render_template(template: &str, vars: &[(&str, String)], raw: &[(&str, String)]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        result.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            result.push_str(&rest[open..]);
            return result;
        };
        let name = &after[..close];
        let is_shell_param = open > 0 && rest.as_bytes()[open - 1] == b'$';

        let replacement = if is_shell_param {
            None
        } else if let Some((_, value)) = vars.iter().find(|(key, _)| *key == name) {
            Some(shell_quote(value))
        } else {
            raw.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.clone())
        };

        match replacement {
            Some(value) => result.push_str(&value),
            None => {
                result.push('{');
                result.push_str(name);
                result.push('}');
            }
        }
        rest = &after[close + 1..];
    }

    result.push_str(rest);
    result
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().collect();
    let start = all.len().saturating_sub(lines);
    all[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::manifest::Configuration;
    use crate::core::planner::BuildProduct;
    use crate::core::platform::Sdk;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn request(root: &Path) -> PlatformBuild {
        let products_dir = root.join("Products").join("Core");
        PlatformBuild {
            target: "Core".to_string(),
            package: "core-pkg".to_string(),
            package_dir: root.to_path_buf(),
            product: BuildProduct::Framework,
            sdk: Sdk::IOSSimulator,
            configuration: Configuration::Release,
            derived_data: root.join("dd"),
            output: products_dir.join("Core.framework"),
            products_dir,
        }
    }

    fn toolchain(build: &str, symbols: &str, assemble: &str) -> CommandToolchain {
        CommandToolchain::new(ToolchainConfig {
            build: build.to_string(),
            symbols: symbols.to_string(),
            assemble: assemble.to_string(),
        })
    }

    #[test]
    fn test_render_quotes_values() {
        let rendered = render_template(
            "build {target} -o {output}",
            &[
                ("target", "My Lib".to_string()),
                ("output", "/tmp/it's".to_string()),
            ],
            &[],
        );
        assert_eq!(rendered, r"build 'My Lib' -o '/tmp/it'\''s'");
    }

    #[test]
    fn test_render_keeps_unknown_and_shell_params() {
        let rendered = render_template(
            "echo {unknown} ${HOME} {target}",
            &[("target", "A".to_string()), ("HOME", "nope".to_string())],
            &[],
        );
        assert_eq!(rendered, "echo {unknown} ${HOME} 'A'");
    }

    #[test]
    fn test_render_raw_is_verbatim() {
        let rendered = render_template(
            "xc -create {slices} -output {output}",
            &[("output", "/out".to_string())],
            &[("slices", "-framework 'a' -framework 'b'".to_string())],
        );
        assert_eq!(rendered, "xc -create -framework 'a' -framework 'b' -output '/out'");
    }

    #[test]
    fn test_render_unterminated_brace() {
        assert_eq!(render_template("a {b", &[], &[]), "a {b");
    }

    #[tokio::test]
    async fn test_build_step_sees_placeholders_and_env() {
        let dir = TempDir::new().unwrap();
        let request = request(dir.path());
        let tools = toolchain(
            "mkdir -p {output} && echo \"$PREBAKE_SDK\" {configuration} > {output}/info",
            "true",
            "true",
        );

        tools.build_platform(&request).await.unwrap();

        let info = std::fs::read_to_string(request.output.join("info")).unwrap();
        assert_eq!(info.trim(), "iphonesimulator Release");
    }

    #[tokio::test]
    async fn test_failure_reports_exit_status_and_stderr() {
        let dir = TempDir::new().unwrap();
        let request = request(dir.path());
        let tools = toolchain("echo boom >&2; exit 65", "true", "true");

        let err = tools.build_platform(&request).await.unwrap_err();
        assert_eq!(err.exit_status, Some(65));
        assert!(err.message.contains("boom"));
    }

    #[tokio::test]
    async fn test_create_bundle_receives_every_slice() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("Core.xcframework");
        let tools = toolchain(
            "true",
            "true",
            "mkdir -p {output} && for s in {slice_paths}; do basename \"$s\" >> {output}/slices; done",
        );
        let slices = vec![
            Slice {
                sdk: Sdk::IOS,
                artifact: PathBuf::from("/dd/iphoneos/Core.framework"),
                symbols: None,
            },
            Slice {
                sdk: Sdk::IOSSimulator,
                artifact: PathBuf::from("/dd/iphonesimulator/Core.framework"),
                symbols: Some(PathBuf::from("/dd/iphonesimulator/Core.dSYM")),
            },
        ];

        tools.create_bundle("Core", &slices, &output).await.unwrap();

        let listed = std::fs::read_to_string(output.join("slices")).unwrap();
        assert_eq!(listed.lines().count(), 2);
    }

    #[test]
    fn test_missing_tools_reports_unknown_programs() {
        let tools = toolchain("definitely-not-a-real-tool-xyz {target}", "sh -c true", "sh");
        assert_eq!(tools.missing_tools(), vec!["definitely-not-a-real-tool-xyz"]);
    }

    #[test]
    fn test_tail_keeps_last_lines() {
        assert_eq!(tail("a\nb\nc", 2), "b\nc");
        assert_eq!(tail("", 2), "");
    }
}
