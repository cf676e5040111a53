#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use buildpipe::config::{load_and_validate, ConfigFile, RawConfigFile};
use buildpipe::fs::{FileSystem, RealFileSystem};
use buildpipe::pipeline::Pipeline;

/// Package descriptor written by [`ProjectFixture::new`].
pub const PACKAGE_JSON: &str = r#"{
  "name": "my-app",
  "version": "1.0.0",
  "author": "X",
  "license": "MIT"
}
"#;

/// A throwaway project directory on the real filesystem.
///
/// The root is canonicalized so paths reported by the OS watcher compare
/// equal to the layout's paths.
pub struct ProjectFixture {
    _dir: TempDir,
    root: PathBuf,
}

impl ProjectFixture {
    /// Empty project with a `package.json` for `my-app` 1.0.0.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("creating temp dir");
        let root = dir.path().canonicalize().expect("canonicalizing temp dir");
        let fixture = Self { _dir: dir, root };
        fixture.write("package.json", PACKAGE_JSON);
        fixture
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    /// Write `content` to `rel`, creating parent directories.
    pub fn write(&self, rel: &str, content: &str) -> &Self {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("creating parent dirs");
        }
        fs::write(&path, content).expect("writing fixture file");
        self
    }

    pub fn mkdir(&self, rel: &str) -> &Self {
        fs::create_dir_all(self.path(rel)).expect("creating fixture dir");
        self
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel)).expect("reading fixture file")
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }

    /// Write `Buildpipe.toml`.
    pub fn config(&self, toml: &str) -> &Self {
        self.write("Buildpipe.toml", toml)
    }

    /// `Buildpipe.toml` if present, built-in defaults otherwise.
    pub fn load_config(&self) -> ConfigFile {
        let path = self.path("Buildpipe.toml");
        if path.is_file() {
            load_and_validate(&path).expect("loading fixture config")
        } else {
            ConfigFile::try_from(RawConfigFile::default()).expect("default config")
        }
    }

    /// Pipeline over the real filesystem for this project.
    pub fn pipeline(&self) -> Arc<Pipeline> {
        let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
        let cfg = self.load_config();
        Arc::new(Pipeline::from_config(&self.root, &cfg, fs).expect("building pipeline"))
    }
}

impl Default for ProjectFixture {
    fn default() -> Self {
        Self::new()
    }
}
