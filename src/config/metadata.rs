// src/config/metadata.rs

//! Project metadata read from the JSON descriptor (`package.json`).

use std::path::Path;

use serde::Deserialize;

use crate::errors::{PipelineError, Result};
use crate::fs::FileSystem;

/// Immutable project facts stamped into every compiled file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProjectMetadata {
    pub name: String,
    pub version: String,
    pub author: String,
    pub license: String,
}

impl ProjectMetadata {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        author: impl Into<String>,
        license: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            author: author.into(),
            license: license.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawDescriptor {
    #[serde(default)]
    name: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    author: Option<RawAuthor>,
    #[serde(default)]
    license: String,
}

/// npm allows `"author": "Jane <j@x.io>"` or an object form.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawAuthor {
    Text(String),
    Person {
        #[serde(default)]
        name: String,
        #[serde(default)]
        email: Option<String>,
    },
}

impl RawAuthor {
    fn render(self) -> String {
        match self {
            RawAuthor::Text(s) => s,
            RawAuthor::Person {
                name,
                email: Some(email),
            } if !email.is_empty() => format!("{name} <{email}>"),
            RawAuthor::Person { name, .. } => name,
        }
    }
}

/// Parse descriptor JSON. Missing fields become empty strings.
pub fn parse_metadata(json: &str) -> Result<ProjectMetadata> {
    let raw: RawDescriptor = serde_json::from_str(json)?;
    Ok(ProjectMetadata {
        name: raw.name,
        version: raw.version,
        author: raw.author.map(RawAuthor::render).unwrap_or_default(),
        license: raw.license,
    })
}

/// Read and parse the descriptor at `path`.
pub fn load_metadata(fs: &dyn FileSystem, path: &Path) -> Result<ProjectMetadata> {
    if !fs.is_file(path) {
        return Err(PipelineError::Metadata(format!(
            "project descriptor {:?} not found",
            path
        )));
    }
    let contents = fs.read_to_string(path)?;
    parse_metadata(&contents)
}
