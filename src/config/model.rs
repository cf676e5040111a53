// src/config/model.rs

use serde::Deserialize;

use crate::types::{CleanMode, ToolchainKind};

/// Top-level configuration as read from `Buildpipe.toml`.
///
/// ```toml
/// [layout]
/// src = "src"
/// dist = "dist"
/// entry = "src/index.js"
///
/// [pipeline]
/// clean = "contents"
///
/// [toolchain]
/// kind = "builtin"
/// ```
///
/// Every section is optional; a missing file is equivalent to an empty one.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub project: ProjectSection,

    #[serde(default)]
    pub layout: LayoutSection,

    #[serde(default)]
    pub pipeline: PipelineSection,

    #[serde(default)]
    pub toolchain: ToolchainSection,

    #[serde(default)]
    pub lint: LintSection,
}

/// Validated configuration. Only obtainable through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    project: ProjectSection,
    layout: LayoutSection,
    pipeline: PipelineSection,
    toolchain: ToolchainSection,
    lint: LintSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            project: raw.project,
            layout: raw.layout,
            pipeline: raw.pipeline,
            toolchain: raw.toolchain,
            lint: raw.lint,
        }
    }

    pub fn project(&self) -> &ProjectSection {
        &self.project
    }

    pub fn layout(&self) -> &LayoutSection {
        &self.layout
    }

    pub fn pipeline(&self) -> &PipelineSection {
        &self.pipeline
    }

    pub fn toolchain(&self) -> &ToolchainSection {
        &self.toolchain
    }

    pub fn lint(&self) -> &LintSection {
        &self.lint
    }
}

/// `[project]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectSection {
    /// JSON descriptor holding `name`, `version`, `author`, `license`.
    #[serde(default = "default_descriptor")]
    pub descriptor: String,
}

fn default_descriptor() -> String {
    "package.json".to_string()
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            descriptor: default_descriptor(),
        }
    }
}

/// `[layout]` section. All paths are relative to the project root.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutSection {
    #[serde(default = "default_src")]
    pub src: String,

    #[serde(default = "default_dist")]
    pub dist: String,

    /// Entry file; must live under `src`.
    #[serde(default = "default_entry")]
    pub entry: String,

    /// Globs (relative to `src`) selecting the files the compile pipeline
    /// owns. Everything else under `src` is treated as an asset.
    #[serde(default = "default_scripts")]
    pub scripts: Vec<String>,
}

fn default_src() -> String {
    "src".to_string()
}

fn default_dist() -> String {
    "dist".to_string()
}

fn default_entry() -> String {
    "src/index.js".to_string()
}

fn default_scripts() -> Vec<String> {
    vec!["**/*.js".to_string()]
}

impl Default for LayoutSection {
    fn default() -> Self {
        Self {
            src: default_src(),
            dist: default_dist(),
            entry: default_entry(),
            scripts: default_scripts(),
        }
    }
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PipelineSection {
    #[serde(default)]
    pub clean: CleanMode,

    /// Skip recompiling a file whose content hash matches the last
    /// successful compile.
    #[serde(default)]
    pub use_hash: bool,
}

/// `[toolchain]` section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ToolchainSection {
    #[serde(default)]
    pub kind: ToolchainKind,

    /// UMD global name; derived from the project name when absent.
    #[serde(default)]
    pub global_name: Option<String>,

    /// External transpile/bundle command. `{input}` is replaced with the
    /// source path and `{name}` with the global name; without `{input}` the
    /// source is piped through stdin.
    #[serde(default)]
    pub transpile: Option<String>,

    /// External lint command (stdin → findings on stdout). Optional.
    #[serde(default)]
    pub lint: Option<String>,

    /// External minify command (stdin → stdout).
    #[serde(default)]
    pub minify: Option<String>,
}

/// `[lint]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LintSection {
    #[serde(default = "default_lint_enabled")]
    pub enabled: bool,

    /// Builtin rule names to switch off.
    #[serde(default)]
    pub disable: Vec<String>,
}

fn default_lint_enabled() -> bool {
    true
}

impl Default for LintSection {
    fn default() -> Self {
        Self {
            enabled: default_lint_enabled(),
            disable: Vec::new(),
        }
    }
}
