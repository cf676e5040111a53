// src/pipeline/clean.rs

use std::path::Path;

use tracing::info;

use crate::errors::Result;
use crate::fs::FileSystem;
use crate::types::CleanMode;

/// Empty (`Contents`) or delete (`Root`) the output root. A missing root is
/// already clean.
pub fn clean(fs: &dyn FileSystem, dist: &Path, mode: CleanMode) -> Result<()> {
    if !fs.exists(dist) {
        return Ok(());
    }

    match mode {
        CleanMode::Root => fs.remove_dir_all(dist)?,
        CleanMode::Contents => {
            for entry in fs.read_dir(dist)? {
                if fs.is_dir(&entry) {
                    fs.remove_dir_all(&entry)?;
                } else {
                    fs.remove_file(&entry)?;
                }
            }
        }
    }

    info!(dist = %dist.display(), mode = ?mode, "cleaned output root");
    Ok(())
}
