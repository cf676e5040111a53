// src/pipeline/mod.rs

//! The compile pipeline and the output-tree maintenance around it.
//!
//! [`Pipeline`] bundles everything a build step needs (layout, metadata,
//! filesystem, toolchain) so the orchestrator and the watch dispatcher can
//! share one `Arc<Pipeline>`.

pub mod cache;
pub mod clean;
pub mod mirror;
pub mod selection;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::banner;
use crate::config::{load_metadata, ConfigFile, ProjectMetadata};
use crate::entry::{self, EntryStatus};
use crate::errors::{PipelineError, Result};
use crate::fs::FileSystem;
use crate::layout::{relative_str, Layout, ScriptFilter};
use crate::toolchain::{self, LintFinding, SourceUnit, Toolchain, TranspileOptions};
use crate::types::CleanMode;

pub use cache::{content_hash, CompileCache};
pub use mirror::MirrorReport;
pub use selection::SourceSelection;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    pub clean_mode: CleanMode,
    pub use_hash: bool,
    /// Browser global of the UMD bundle.
    pub global_name: String,
}

impl PipelineOptions {
    /// `[pipeline]` settings plus the UMD global, which falls back to the
    /// camel-cased project name.
    pub fn from_config(cfg: &ConfigFile, metadata: &ProjectMetadata) -> Self {
        Self {
            clean_mode: cfg.pipeline().clean,
            use_hash: cfg.pipeline().use_hash,
            global_name: cfg
                .toolchain()
                .global_name
                .clone()
                .unwrap_or_else(|| banner::global_name(&metadata.name)),
        }
    }
}

/// Outcome of one compile invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileReport {
    /// Output files written.
    pub written: Vec<PathBuf>,
    /// Sources skipped because their content hash was unchanged.
    pub skipped: Vec<PathBuf>,
    /// Lint findings per source; files without findings are absent.
    pub findings: Vec<(PathBuf, Vec<LintFinding>)>,
}

/// A compiled file waiting for the rest of the batch to succeed.
struct Staged {
    source: PathBuf,
    output: PathBuf,
    hash: String,
    text: String,
}

#[derive(Debug)]
pub struct Pipeline {
    layout: Layout,
    metadata: ProjectMetadata,
    fs: Arc<dyn FileSystem>,
    toolchain: Arc<dyn Toolchain>,
    scripts: ScriptFilter,
    options: PipelineOptions,
    cache: Mutex<CompileCache>,
}

impl Pipeline {
    pub fn new(
        layout: Layout,
        metadata: ProjectMetadata,
        fs: Arc<dyn FileSystem>,
        toolchain: Arc<dyn Toolchain>,
        scripts: ScriptFilter,
        options: PipelineOptions,
    ) -> Self {
        Self {
            layout,
            metadata,
            fs,
            toolchain,
            scripts,
            options,
            cache: Mutex::new(CompileCache::new()),
        }
    }

    /// Wire a pipeline for the project rooted at `root`: load the metadata
    /// descriptor and build the configured toolchain.
    pub fn from_config(root: &Path, cfg: &ConfigFile, fs: Arc<dyn FileSystem>) -> Result<Self> {
        let layout = Layout::from_config(root, cfg);
        let metadata = load_metadata(fs.as_ref(), &root.join(&cfg.project().descriptor))?;
        let scripts = ScriptFilter::from_config(cfg)?;
        let options = PipelineOptions::from_config(cfg, &metadata);
        let toolchain = toolchain::from_config(root, cfg, fs.clone())?;

        debug!(
            root = %root.display(),
            project = %metadata.name,
            toolchain = %toolchain.kind(),
            "pipeline configured"
        );

        Ok(Self::new(layout, metadata, fs, toolchain, scripts, options))
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn metadata(&self) -> &ProjectMetadata {
        &self.metadata
    }

    pub fn fs(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    pub fn toolchain(&self) -> &dyn Toolchain {
        self.toolchain.as_ref()
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Globs deciding which sources are compiled rather than copied.
    pub fn scripts(&self) -> &ScriptFilter {
        &self.scripts
    }

    fn cache(&self) -> MutexGuard<'_, CompileCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// read → transpile → lint (source) → minify → banner for every selected file,
    /// then write all outputs. Nothing is written unless every file made it
    /// through.
    pub async fn compile(&self, selection: &SourceSelection) -> Result<CompileReport> {
        let sources = selection.resolve(self.fs.as_ref(), &self.layout, &self.scripts)?;
        let banner = banner::format(&self.metadata);
        let opts = TranspileOptions {
            global_name: self.options.global_name.clone(),
        };

        let mut report = CompileReport::default();
        let mut staged = Vec::with_capacity(sources.len());

        for source in sources {
            let output = self.layout.output_path(&source).ok_or_else(|| {
                PipelineError::Config(format!(
                    "{} is outside the source root {}",
                    source.display(),
                    self.layout.src.display()
                ))
            })?;

            let code = self.fs.read_to_string(&source)?;
            let hash = content_hash(code.as_bytes());

            let fresh = self.options.use_hash
                && self.fs.is_file(&output)
                && self.cache().is_fresh(&source, &hash);
            if fresh {
                debug!(path = %source.display(), "unchanged since last compile; skipping");
                report.skipped.push(source);
                continue;
            }

            let unit = SourceUnit {
                path: source.clone(),
                code,
            };
            let bundled = SourceUnit {
                code: self.toolchain.transpile(&unit, &opts).await?,
                path: unit.path.clone(),
            };

            // Lint the module as written so reported positions match the file.
            let findings = self.toolchain.lint(&unit).await?;
            if !findings.is_empty() {
                let shown = relative_str(&self.layout.root, &source)
                    .map(PathBuf::from)
                    .unwrap_or_else(|| source.clone());
                print!("{}", toolchain::report::stylish(&shown, &findings));
                warn!(path = %source.display(), count = findings.len(), "lint findings");
                report.findings.push((source.clone(), findings));
            }

            let minified = self.toolchain.minify(&bundled).await?;

            staged.push(Staged {
                source,
                output,
                hash,
                text: format!("{banner}{minified}"),
            });
        }

        for file in staged {
            self.fs.write(&file.output, file.text.as_bytes())?;
            if self.options.use_hash {
                self.cache().record(&file.source, file.hash);
            }
            info!(
                source = %file.source.display(),
                output = %file.output.display(),
                "compiled"
            );
            report.written.push(file.output);
        }

        Ok(report)
    }

    /// Delete the output mapped from `source`. A missing output is not an
    /// error. Returns the removed path, if any.
    pub fn remove_output(&self, source: &Path) -> Result<Option<PathBuf>> {
        let Some(output) = self.layout.output_path(source) else {
            return Ok(None);
        };
        self.cache().invalidate(source);

        if self.fs.is_dir(&output) {
            self.fs.remove_dir_all(&output)?;
        } else if self.fs.is_file(&output) {
            self.fs.remove_file(&output)?;
        } else {
            debug!(path = %output.display(), "no output to remove");
            return Ok(None);
        }

        info!(path = %output.display(), "removed output");
        Ok(Some(output))
    }

    /// Delete the output directory mapped from `source`, then make sure the
    /// entry file still exists (the removed directory may have held it).
    pub fn remove_output_dir(&self, source: &Path) -> Result<EntryStatus> {
        if let Some(output) = self.layout.output_path(source) {
            self.cache().invalidate_under(source);
            if self.fs.is_dir(&output) {
                self.fs.remove_dir_all(&output)?;
                info!(path = %output.display(), "removed output directory");
            }
        }
        self.ensure_entry()
    }

    /// Copy a non-script file verbatim to its output location.
    pub fn copy_asset(&self, source: &Path) -> Result<Option<PathBuf>> {
        let Some(output) = self.layout.output_path(source) else {
            return Ok(None);
        };
        let bytes = self.fs.read(source)?;
        self.fs.write(&output, &bytes)?;
        info!(source = %source.display(), output = %output.display(), "copied asset");
        Ok(Some(output))
    }

    pub fn mirror(&self) -> Result<MirrorReport> {
        mirror::mirror(self.fs.as_ref(), &self.layout, &self.scripts)
    }

    pub fn clean(&self) -> Result<()> {
        self.cache().invalidate_under(&self.layout.src);
        clean::clean(self.fs.as_ref(), &self.layout.dist, self.options.clean_mode)
    }

    pub fn ensure_entry(&self) -> Result<EntryStatus> {
        entry::ensure(self.fs.as_ref(), &self.layout.entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use crate::toolchain::{BuiltinToolchain, Linter};

    fn pipeline(fs: &MockFileSystem, use_hash: bool) -> Pipeline {
        let fs: Arc<dyn FileSystem> = Arc::new(fs.clone());
        Pipeline::new(
            Layout::new("/p", "src", "dist", "src/index.js"),
            ProjectMetadata::new("my-app", "1.0.0", "X", "MIT"),
            fs.clone(),
            Arc::new(BuiltinToolchain::new(fs, Some(Linter::new(&[]).unwrap()))),
            ScriptFilter::default(),
            PipelineOptions {
                clean_mode: CleanMode::Contents,
                use_hash,
                global_name: "myApp".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn compile_writes_banner_and_umd_bundle() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/src/index.js", "export const answer = 42;\n");

        let report = pipeline(&fs, false).compile(&SourceSelection::All).await.unwrap();

        assert_eq!(report.written, vec![PathBuf::from("/p/dist/index.js")]);
        let out = fs.read_to_string(Path::new("/p/dist/index.js")).unwrap();
        assert!(out.starts_with("/*\n My App v1.0.0\n (c) X \n License: MIT\n */\n"));
        assert!(out.contains("global.myApp"));
        assert!(out.contains("exports.answer"), "{out}");
    }

    #[tokio::test]
    async fn one_broken_file_blocks_every_write() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/src/a.js", "export const a = 1;\n");
        fs.add_file("/p/src/b.js", "export const b = 'unterminated;\n");

        let err = pipeline(&fs, false)
            .compile(&SourceSelection::All)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Syntax { .. }));
        assert!(!fs.exists(Path::new("/p/dist/a.js")));
        assert!(!fs.exists(Path::new("/p/dist/b.js")));
    }

    #[tokio::test]
    async fn lint_findings_do_not_fail_the_build() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/src/index.js", "export const same = 1 == 1;\n");

        let report = pipeline(&fs, false).compile(&SourceSelection::All).await.unwrap();

        assert_eq!(report.written.len(), 1);
        assert_eq!(report.findings.len(), 1);
        let finding = &report.findings[0].1[0];
        assert_eq!(finding.rule, "eqeqeq");
        // Position within the source file, not the generated bundle.
        assert_eq!((finding.line, finding.column), (1, 23));
    }

    #[tokio::test]
    async fn unchanged_sources_are_skipped_with_hashing() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/src/index.js", "export const a = 1;\n");
        let p = pipeline(&fs, true);

        let first = p.compile(&SourceSelection::All).await.unwrap();
        let second = p.compile(&SourceSelection::All).await.unwrap();
        assert_eq!(first.written.len(), 1);
        assert_eq!(second.skipped, vec![PathBuf::from("/p/src/index.js")]);

        p.remove_output(Path::new("/p/src/index.js")).unwrap();
        let third = p.compile(&SourceSelection::All).await.unwrap();
        assert_eq!(third.written.len(), 1);
    }

    #[tokio::test]
    async fn file_outside_src_is_rejected() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/other/x.js", "var x;\n");

        let err = pipeline(&fs, false)
            .compile(&SourceSelection::File(PathBuf::from("other/x.js")))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn remove_output_dir_reensures_entry() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/dist/lib/a.js", "x");
        let p = pipeline(&fs, false);

        let status = p.remove_output_dir(Path::new("/p/src/lib")).unwrap();

        assert!(!fs.exists(Path::new("/p/dist/lib")));
        assert_eq!(status, EntryStatus::Created);
        assert!(fs.is_file(Path::new("/p/src/index.js")));
    }

    #[test]
    fn remove_missing_output_is_ok() {
        let fs = MockFileSystem::new();
        let p = pipeline(&fs, false);
        assert_eq!(p.remove_output(Path::new("/p/src/gone.js")).unwrap(), None);
    }

    #[test]
    fn copy_asset_copies_bytes() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/src/img/logo.png", vec![0u8, 1, 2]);
        let p = pipeline(&fs, false);

        let out = p.copy_asset(Path::new("/p/src/img/logo.png")).unwrap();

        assert_eq!(out, Some(PathBuf::from("/p/dist/img/logo.png")));
        assert_eq!(fs.read(Path::new("/p/dist/img/logo.png")).unwrap(), vec![0, 1, 2]);
    }
}
