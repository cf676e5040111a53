// src/entry.rs

//! Guarantees the workspace entry file exists.

use std::path::Path;

use tracing::info;

use crate::errors::Result;
use crate::fs::FileSystem;

/// Content written to a freshly created entry file.
pub const PLACEHOLDER: &str = "/**\n Workspace entry point.\n Write the main application logic here and import every public module from here.\n*/\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    Created,
    Existing,
}

/// Create `entry` (and its directory) with placeholder content if missing.
///
/// An existing file is never touched.
pub fn ensure(fs: &dyn FileSystem, entry: &Path) -> Result<EntryStatus> {
    if fs.is_file(entry) {
        return Ok(EntryStatus::Existing);
    }

    if let Some(parent) = entry.parent() {
        if !fs.is_dir(parent) {
            fs.create_dir_all(parent)?;
        }
    }
    fs.write(entry, PLACEHOLDER.as_bytes())?;

    info!(path = ?entry, "created placeholder entry file");
    Ok(EntryStatus::Created)
}
