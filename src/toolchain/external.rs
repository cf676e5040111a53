// src/toolchain/external.rs

//! Toolchain backed by shell commands (rollup / jshint / uglify style).

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use regex::Regex;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::errors::{PipelineError, Result};
use crate::toolchain::lint::LintFinding;
use crate::toolchain::{SourceUnit, ToolFuture, Toolchain, TranspileOptions};
use crate::types::ToolchainKind;

#[derive(Debug, Clone)]
pub struct ExternalToolchain {
    root: PathBuf,
    transpile: String,
    lint: Option<String>,
    minify: String,
    finding_line: Regex,
}

impl ExternalToolchain {
    /// `root` is the working directory for every command.
    pub fn new(
        root: impl Into<PathBuf>,
        transpile: impl Into<String>,
        lint: Option<String>,
        minify: impl Into<String>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            root: root.into(),
            transpile: transpile.into(),
            lint,
            minify: minify.into(),
            // jshint: `stdin: line 3, col 7, Expected '===' and instead saw '=='. (W116)`
            finding_line: Regex::new(
                r"line (\d+), col (\d+), (.*?)(?: \(([A-Z]\d+)\))?\s*$",
            )?,
        })
    }

    fn parse_findings(&self, stdout: &str) -> Vec<LintFinding> {
        stdout
            .lines()
            .filter_map(|line| {
                let caps = self.finding_line.captures(line)?;
                Some(LintFinding {
                    line: caps[1].parse().ok()?,
                    column: caps[2].parse().ok()?,
                    rule: caps
                        .get(4)
                        .map(|m| m.as_str().to_string())
                        .unwrap_or_else(|| "external".to_string()),
                    message: caps[3].to_string(),
                })
            })
            .collect()
    }
}

impl Toolchain for ExternalToolchain {
    fn kind(&self) -> ToolchainKind {
        ToolchainKind::External
    }

    fn transpile<'a>(
        &'a self,
        unit: &'a SourceUnit,
        opts: &'a TranspileOptions,
    ) -> ToolFuture<'a, String> {
        Box::pin(async move {
            let uses_path = self.transpile.contains("{input}");
            let command_line = self
                .transpile
                .replace("{input}", &shell_quote(&unit.path))
                .replace("{name}", &opts.global_name);
            let stdin = (!uses_path).then(|| unit.code.clone());

            let output = run_shell(&command_line, &self.root, stdin).await?;
            stdout_of("transpile", &command_line, output)
        })
    }

    fn lint<'a>(&'a self, unit: &'a SourceUnit) -> ToolFuture<'a, Vec<LintFinding>> {
        Box::pin(async move {
            let Some(command_line) = self.lint.as_deref() else {
                return Ok(Vec::new());
            };
            let output = run_shell(command_line, &self.root, Some(unit.code.clone())).await?;

            // Linters exit non-zero when they report findings.
            let stdout = String::from_utf8_lossy(&output.stdout);
            let findings = self.parse_findings(&stdout);
            if !output.status.success() && findings.is_empty() {
                warn!(
                    path = %unit.path.display(),
                    cmd = %command_line,
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "lint command failed without reporting findings"
                );
            }
            Ok(findings)
        })
    }

    fn minify<'a>(&'a self, unit: &'a SourceUnit) -> ToolFuture<'a, String> {
        Box::pin(async move {
            let output = run_shell(&self.minify, &self.root, Some(unit.code.clone())).await?;
            stdout_of("minify", &self.minify, output)
        })
    }
}

/// Run `command_line` through the platform shell, optionally feeding
/// `stdin`, and collect its output.
async fn run_shell(command_line: &str, cwd: &Path, stdin: Option<String>) -> Result<Output> {
    info!(cmd = %command_line, "running external tool");

    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command_line);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command_line);
        c
    };

    cmd.current_dir(cwd)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|e| PipelineError::Tool {
        tool: command_line.to_string(),
        message: format!("spawning process: {e}"),
    })?;

    // Feed stdin from its own task so a tool that writes before it has read
    // everything cannot deadlock against us.
    if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
        tokio::spawn(async move {
            if let Err(err) = pipe.write_all(input.as_bytes()).await {
                debug!(error = %err, "writing tool stdin failed");
            }
        });
    }

    let output = child.wait_with_output().await.map_err(|e| PipelineError::Tool {
        tool: command_line.to_string(),
        message: format!("waiting for process: {e}"),
    })?;

    debug!(
        cmd = %command_line,
        exit_code = output.status.code().unwrap_or(-1),
        stdout_bytes = output.stdout.len(),
        "external tool exited"
    );
    Ok(output)
}

fn stdout_of(step: &str, command_line: &str, output: Output) -> Result<String> {
    if !output.status.success() {
        return Err(PipelineError::Tool {
            tool: format!("{step} (`{command_line}`)"),
            message: format!(
                "exited with code {}: {}",
                output.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }
    String::from_utf8(output.stdout).map_err(|e| PipelineError::Tool {
        tool: format!("{step} (`{command_line}`)"),
        message: format!("output is not UTF-8: {e}"),
    })
}

/// Single-quote a path for `sh -c`.
fn shell_quote(path: &Path) -> String {
    format!("'{}'", path.display().to_string().replace('\'', r"'\''"))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn unit(code: &str) -> SourceUnit {
        SourceUnit {
            path: PathBuf::from("/tmp/it's here/a.js"),
            code: code.to_string(),
        }
    }

    fn opts() -> TranspileOptions {
        TranspileOptions {
            global_name: "myApp".to_string(),
        }
    }

    #[test]
    fn quotes_paths_with_single_quotes() {
        assert_eq!(
            shell_quote(Path::new("/tmp/it's/a.js")),
            r"'/tmp/it'\''s/a.js'"
        );
    }

    #[test]
    fn parses_jshint_lines() {
        let tc = ExternalToolchain::new("/", "cat", None, "cat").unwrap();
        let findings = tc.parse_findings(
            "stdin: line 3, col 7, Expected '===' and instead saw '=='. (W116)\n\
             stdin: line 9, col 1, Missing semicolon.\n\
             \n\
             2 errors\n",
        );
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].line, 3);
        assert_eq!(findings[0].column, 7);
        assert_eq!(findings[0].rule, "W116");
        assert_eq!(findings[0].message, "Expected '===' and instead saw '=='.");
        assert_eq!(findings[1].rule, "external");
    }

    #[tokio::test]
    async fn stdin_commands_round_trip() {
        let tc = ExternalToolchain::new("/", "cat", None, "tr -d ' '").unwrap();
        let u = unit("var a = 1;");
        assert_eq!(tc.transpile(&u, &opts()).await.unwrap(), "var a = 1;");
        assert_eq!(tc.minify(&u).await.unwrap(), "vara=1;");
        assert!(tc.lint(&u).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn placeholders_are_substituted() {
        let tc = ExternalToolchain::new("/", "echo {name} {input}", None, "cat").unwrap();
        let out = tc.transpile(&unit(""), &opts()).await.unwrap();
        assert_eq!(out, "myApp /tmp/it's here/a.js\n");
    }

    #[tokio::test]
    async fn failing_command_is_a_tool_error() {
        let tc = ExternalToolchain::new("/", "echo boom >&2; exit 3", None, "cat").unwrap();
        let err = tc.transpile(&unit("x"), &opts()).await.unwrap_err();
        match err {
            PipelineError::Tool { message, .. } => {
                assert!(message.contains("code 3"), "{message}");
                assert!(message.contains("boom"), "{message}");
            }
            other => panic!("expected tool error, got {other:?}"),
        }
    }
}
