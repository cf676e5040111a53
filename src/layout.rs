// src/layout.rs

//! Source / output directory layout and the source → output path mapping.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::config::ConfigFile;

/// Resolved project layout. All paths are absolute (or rooted at whatever
/// `root` the caller handed in).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub root: PathBuf,
    pub src: PathBuf,
    pub dist: PathBuf,
    pub entry: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>, src: &str, dist: &str, entry: &str) -> Self {
        let root = root.into();
        Self {
            src: root.join(src),
            dist: root.join(dist),
            entry: root.join(entry),
            root,
        }
    }

    pub fn from_config(root: impl Into<PathBuf>, cfg: &ConfigFile) -> Self {
        let layout = cfg.layout();
        Self::new(root, &layout.src, &layout.dist, &layout.entry)
    }

    /// Map a path under `src` to the same relative path under `dist`.
    ///
    /// Returns `None` for paths outside the source root.
    pub fn output_path(&self, source: &Path) -> Option<PathBuf> {
        let rel = source.strip_prefix(&self.src).ok()?;
        Some(self.dist.join(rel))
    }

    /// Forward-slash path relative to `src`, as used for glob matching.
    pub fn relative_source(&self, source: &Path) -> Option<String> {
        relative_str(&self.src, source)
    }

    pub fn is_output(&self, path: &Path) -> bool {
        path.starts_with(&self.dist)
    }
}

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// Falls back to canonicalized paths when a plain `strip_prefix` fails
/// (symlinked temp dirs, `/private/var` on macOS).
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(rel.to_string_lossy().replace('\\', "/"));
    }

    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(rel.to_string_lossy().replace('\\', "/"));
        }
    }

    None
}

/// Compiled `[layout].scripts` globs.
#[derive(Debug, Clone)]
pub struct ScriptFilter {
    set: GlobSet,
}

impl ScriptFilter {
    pub fn new(patterns: &[String]) -> Result<Self> {
        Ok(Self {
            set: build_globset(patterns)?,
        })
    }

    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        Self::new(&cfg.layout().scripts)
    }

    /// `rel_path` is relative to `src`, forward slashes.
    pub fn is_script(&self, rel_path: &str) -> bool {
        self.set.is_match(rel_path)
    }
}

impl Default for ScriptFilter {
    /// `**/*.js`
    fn default() -> Self {
        let mut builder = GlobSetBuilder::new();
        if let Ok(glob) = Glob::new("**/*.js") {
            builder.add(glob);
        }
        Self {
            set: builder.build().unwrap_or_else(|_| GlobSet::empty()),
        }
    }
}

/// Build a GlobSet from simple string patterns.
pub(crate) fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
