// src/config/mod.rs

//! Configuration loading and validation for buildpipe.
//!
//! - `Buildpipe.toml` data model (`model.rs`), loading (`loader.rs`) and
//!   semantic checks (`validate.rs`).
//! - Project metadata from the JSON descriptor (`metadata.rs`).

pub mod loader;
pub mod metadata;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_or_default};
pub use metadata::{load_metadata, parse_metadata, ProjectMetadata};
pub use model::{
    ConfigFile, LayoutSection, LintSection, PipelineSection, ProjectSection, RawConfigFile,
    ToolchainSection,
};
