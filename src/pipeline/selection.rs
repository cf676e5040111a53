// src/pipeline/selection.rs

use std::path::PathBuf;

use globset::Glob;

use crate::errors::{PipelineError, Result};
use crate::fs::{walk, FileSystem};
use crate::layout::{Layout, ScriptFilter};

/// Which sources a compile run covers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SourceSelection {
    /// Every file under `src` matching `[layout].scripts`.
    #[default]
    All,
    /// Files under `src` matching this glob (relative to `src`).
    Pattern(String),
    /// One file; relative paths are taken from the project root.
    File(PathBuf),
}

impl SourceSelection {
    /// Concrete, sorted list of source files.
    pub fn resolve(
        &self,
        fs: &dyn FileSystem,
        layout: &Layout,
        scripts: &ScriptFilter,
    ) -> Result<Vec<PathBuf>> {
        match self {
            SourceSelection::All => source_files(fs, layout, |rel| scripts.is_script(rel)),
            SourceSelection::Pattern(pattern) => {
                let matcher = Glob::new(pattern)
                    .map_err(|e| {
                        PipelineError::Config(format!("invalid source pattern {pattern:?}: {e}"))
                    })?
                    .compile_matcher();
                source_files(fs, layout, |rel| matcher.is_match(rel))
            }
            SourceSelection::File(path) => {
                let path = if path.is_absolute() {
                    path.clone()
                } else {
                    layout.root.join(path)
                };
                Ok(vec![path])
            }
        }
    }
}

fn source_files<F>(fs: &dyn FileSystem, layout: &Layout, keep: F) -> Result<Vec<PathBuf>>
where
    F: Fn(&str) -> bool,
{
    if !fs.is_dir(&layout.src) {
        return Ok(Vec::new());
    }
    let (_, files) = walk(fs, &layout.src)?;
    Ok(files
        .into_iter()
        .filter(|f| layout.relative_source(f).is_some_and(|rel| keep(&rel)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn fixture() -> (MockFileSystem, Layout) {
        let fs = MockFileSystem::new();
        fs.add_file("/p/src/index.js", "");
        fs.add_file("/p/src/lib/util.js", "");
        fs.add_file("/p/src/lib/style.css", "");
        (fs, Layout::new("/p", "src", "dist", "src/index.js"))
    }

    #[test]
    fn all_selects_scripts_only() {
        let (fs, layout) = fixture();
        let files = SourceSelection::default()
            .resolve(&fs, &layout, &ScriptFilter::default())
            .unwrap();
        assert_eq!(
            files,
            vec![
                PathBuf::from("/p/src/index.js"),
                PathBuf::from("/p/src/lib/util.js")
            ]
        );
    }

    #[test]
    fn pattern_is_relative_to_src() {
        let (fs, layout) = fixture();
        let files = SourceSelection::Pattern("lib/*".to_string())
            .resolve(&fs, &layout, &ScriptFilter::default())
            .unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.starts_with("/p/src/lib")));
    }

    #[test]
    fn relative_file_is_joined_to_root() {
        let (fs, layout) = fixture();
        let files = SourceSelection::File(PathBuf::from("src/index.js"))
            .resolve(&fs, &layout, &ScriptFilter::default())
            .unwrap();
        assert_eq!(files, vec![PathBuf::from("/p/src/index.js")]);
    }

    #[test]
    fn missing_src_selects_nothing() {
        let fs = MockFileSystem::new();
        let layout = Layout::new("/p", "src", "dist", "src/index.js");
        assert!(
            SourceSelection::All
                .resolve(&fs, &layout, &ScriptFilter::default())
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn bad_pattern_is_a_config_error() {
        let (fs, layout) = fixture();
        let err = SourceSelection::Pattern("a/[".to_string())
            .resolve(&fs, &layout, &ScriptFilter::default())
            .unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }
}
