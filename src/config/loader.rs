// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{PipelineError, Result};

/// Config file name looked up in the working directory by default.
pub const DEFAULT_CONFIG_FILE: &str = "Buildpipe.toml";

/// Load a configuration file from a given path and return the raw
/// `RawConfigFile`. Only TOML deserialization happens here.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    ConfigFile::try_from(raw_config)
}

/// Resolve the config the CLI asked for.
///
/// - An explicit path must exist.
/// - Without one, `Buildpipe.toml` in the working directory is used if
///   present, otherwise the built-in defaults apply.
pub fn load_or_default(explicit: Option<&Path>) -> Result<ConfigFile> {
    match explicit {
        Some(path) => {
            if !path.is_file() {
                return Err(PipelineError::Config(format!(
                    "config file {:?} does not exist",
                    path
                )));
            }
            load_and_validate(path)
        }
        None => {
            let path = default_config_path();
            if path.is_file() {
                load_and_validate(&path)
            } else {
                info!("no {DEFAULT_CONFIG_FILE} found; using built-in defaults");
                ConfigFile::try_from(RawConfigFile::default())
            }
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_FILE)
}
