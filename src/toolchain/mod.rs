// src/toolchain/mod.rs

//! Transpile / lint / minify tools behind one seam.
//!
//! - [`BuiltinToolchain`] runs the in-process [`bundle`], [`lint`] and
//!   [`minify`] modules, all parsing through [`syntax`] (`oxc`).
//! - [`external::ExternalToolchain`] shells out to configured commands.
//!
//! The compile pipeline only ever talks to `Arc<dyn Toolchain>`, so tests
//! can swap in their own implementation.

pub mod bundle;
pub mod external;
pub mod lint;
pub mod minify;
pub mod report;
pub mod syntax;

use std::fmt::Debug;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use crate::config::ConfigFile;
use crate::errors::{PipelineError, Result};
use crate::fs::FileSystem;
use crate::types::ToolchainKind;

pub use external::ExternalToolchain;
pub use lint::{LintFinding, Linter};

/// Boxed future returned by toolchain operations.
pub type ToolFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// One file travelling through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    pub path: PathBuf,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranspileOptions {
    /// Browser global the UMD wrapper registers.
    pub global_name: String,
}

pub trait Toolchain: Send + Sync + Debug {
    fn kind(&self) -> ToolchainKind;

    /// Bundle `unit` and its imports into a single UMD module.
    fn transpile<'a>(
        &'a self,
        unit: &'a SourceUnit,
        opts: &'a TranspileOptions,
    ) -> ToolFuture<'a, String>;

    /// Lint the source module as written, so findings point into it.
    /// Findings never fail the build; only a broken tool does.
    fn lint<'a>(&'a self, unit: &'a SourceUnit) -> ToolFuture<'a, Vec<LintFinding>>;

    fn minify<'a>(&'a self, unit: &'a SourceUnit) -> ToolFuture<'a, String>;
}

#[derive(Debug, Clone)]
pub struct BuiltinToolchain {
    fs: Arc<dyn FileSystem>,
    linter: Option<Linter>,
}

impl BuiltinToolchain {
    /// `linter == None` switches linting off.
    pub fn new(fs: Arc<dyn FileSystem>, linter: Option<Linter>) -> Self {
        Self { fs, linter }
    }
}

impl Toolchain for BuiltinToolchain {
    fn kind(&self) -> ToolchainKind {
        ToolchainKind::Builtin
    }

    fn transpile<'a>(
        &'a self,
        unit: &'a SourceUnit,
        opts: &'a TranspileOptions,
    ) -> ToolFuture<'a, String> {
        Box::pin(async move {
            bundle::bundle(self.fs.as_ref(), &unit.path, &unit.code, &opts.global_name)
        })
    }

    fn lint<'a>(&'a self, unit: &'a SourceUnit) -> ToolFuture<'a, Vec<LintFinding>> {
        Box::pin(async move {
            match &self.linter {
                Some(linter) => linter.lint(&unit.path, &unit.code),
                None => Ok(Vec::new()),
            }
        })
    }

    fn minify<'a>(&'a self, unit: &'a SourceUnit) -> ToolFuture<'a, String> {
        Box::pin(async move { minify::minify(&unit.path, &unit.code) })
    }
}

/// Build the toolchain selected by `[toolchain] kind`.
pub fn from_config(
    root: &Path,
    cfg: &ConfigFile,
    fs: Arc<dyn FileSystem>,
) -> Result<Arc<dyn Toolchain>> {
    let section = cfg.toolchain();
    match section.kind {
        ToolchainKind::Builtin => {
            let linter = Linter::from_config(cfg)?;
            Ok(Arc::new(BuiltinToolchain::new(fs, linter)))
        }
        ToolchainKind::External => {
            let (Some(transpile), Some(minify)) = (&section.transpile, &section.minify) else {
                return Err(PipelineError::Config(
                    "external toolchain requires `transpile` and `minify` commands".to_string(),
                ));
            };
            let lint = if cfg.lint().enabled {
                section.lint.clone()
            } else {
                None
            };
            Ok(Arc::new(ExternalToolchain::new(
                root,
                transpile.clone(),
                lint,
                minify.clone(),
            )?))
        }
    }
}
