// src/types.rs

use std::fmt;

use serde::Deserialize;

/// What the cleaner removes before a fresh build.
///
/// - `Contents`: delete everything inside the output root, keep the root
///   itself (default).
/// - `Root`: delete the output root directory altogether.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CleanMode {
    #[default]
    Contents,
    Root,
}

/// Which toolchain performs transpile / lint / minify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolchainKind {
    /// In-process `oxc`-based bundler, linter and minifier.
    #[default]
    Builtin,
    /// Shell commands configured under `[toolchain]`.
    External,
}

impl fmt::Display for ToolchainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolchainKind::Builtin => f.write_str("builtin"),
            ToolchainKind::External => f.write_str("external"),
        }
    }
}
