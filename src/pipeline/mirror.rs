// src/pipeline/mirror.rs

use tracing::{debug, info};

use crate::errors::Result;
use crate::fs::{walk, FileSystem};
use crate::layout::{Layout, ScriptFilter};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorReport {
    /// Directories created (or already present) under `dist`.
    pub dirs: usize,
    /// Non-script files copied verbatim.
    pub assets: usize,
}

/// Replicate the directory tree of `src` under `dist`, empty directories
/// included, and copy every non-script file. Script files are left to the
/// compile pipeline.
pub fn mirror(fs: &dyn FileSystem, layout: &Layout, scripts: &ScriptFilter) -> Result<MirrorReport> {
    let mut report = MirrorReport::default();
    fs.create_dir_all(&layout.dist)?;

    if !fs.is_dir(&layout.src) {
        debug!(src = %layout.src.display(), "source root missing; nothing to mirror");
        return Ok(report);
    }

    let (dirs, files) = walk(fs, &layout.src)?;

    for dir in dirs.iter() {
        if let Some(out) = layout.output_path(dir) {
            fs.create_dir_all(&out)?;
            report.dirs += 1;
        }
    }

    for file in files.iter() {
        let is_script = layout
            .relative_source(file)
            .is_some_and(|rel| scripts.is_script(&rel));
        if is_script {
            continue;
        }
        if let Some(out) = layout.output_path(file) {
            fs.write(&out, &fs.read(file)?)?;
            report.assets += 1;
        }
    }

    info!(dirs = report.dirs, assets = report.assets, "mirrored source tree");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use std::path::Path;

    #[test]
    fn creates_every_directory_and_copies_assets() {
        let fs = MockFileSystem::new();
        fs.add_dir("/p/src/empty");
        fs.add_dir("/p/src/a/b/c");
        fs.add_file("/p/src/a/logo.svg", "<svg/>");
        fs.add_file("/p/src/a/code.js", "var x;");
        let layout = Layout::new("/p", "src", "dist", "src/index.js");

        let report = mirror(&fs, &layout, &ScriptFilter::default()).unwrap();

        for dir in ["/p/dist/empty", "/p/dist/a", "/p/dist/a/b", "/p/dist/a/b/c"] {
            assert!(fs.is_dir(Path::new(dir)), "{dir} missing");
        }
        assert_eq!(fs.read_to_string(Path::new("/p/dist/a/logo.svg")).unwrap(), "<svg/>");
        assert!(!fs.exists(Path::new("/p/dist/a/code.js")));
        assert_eq!(report, MirrorReport { dirs: 4, assets: 1 });
    }

    #[test]
    fn is_idempotent() {
        let fs = MockFileSystem::new();
        fs.add_dir("/p/src/x");
        let layout = Layout::new("/p", "src", "dist", "src/index.js");

        let first = mirror(&fs, &layout, &ScriptFilter::default()).unwrap();
        let paths = fs.paths();
        let second = mirror(&fs, &layout, &ScriptFilter::default()).unwrap();

        assert_eq!(first, second);
        assert_eq!(paths, fs.paths());
    }
}
