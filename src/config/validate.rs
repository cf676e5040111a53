// src/config/validate.rs

use std::path::{Component, Path, PathBuf};

use globset::Glob;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{PipelineError, Result};
use crate::toolchain::lint::RULE_NAMES;
use crate::types::ToolchainKind;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = PipelineError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_layout(cfg)?;
    validate_scripts(cfg)?;
    validate_toolchain(cfg)?;
    validate_lint(cfg)?;
    Ok(())
}

fn validate_layout(cfg: &RawConfigFile) -> Result<()> {
    let src = normalized(&cfg.layout.src);
    let dist = normalized(&cfg.layout.dist);
    let entry = normalized(&cfg.layout.entry);

    if src.as_os_str().is_empty() || dist.as_os_str().is_empty() {
        return Err(PipelineError::Config(
            "[layout].src and [layout].dist must not be empty".to_string(),
        ));
    }

    if src.starts_with(&dist) || dist.starts_with(&src) {
        return Err(PipelineError::Config(format!(
            "[layout].src ({}) and [layout].dist ({}) must not contain each other",
            cfg.layout.src, cfg.layout.dist
        )));
    }

    if entry == src || !entry.starts_with(&src) {
        return Err(PipelineError::Config(format!(
            "[layout].entry ({}) must be a file under [layout].src ({})",
            cfg.layout.entry, cfg.layout.src
        )));
    }

    Ok(())
}

fn validate_scripts(cfg: &RawConfigFile) -> Result<()> {
    if cfg.layout.scripts.is_empty() {
        return Err(PipelineError::Config(
            "[layout].scripts must list at least one glob".to_string(),
        ));
    }
    for pat in cfg.layout.scripts.iter() {
        Glob::new(pat).map_err(|e| {
            PipelineError::Config(format!("invalid [layout].scripts glob '{pat}': {e}"))
        })?;
    }
    Ok(())
}

fn validate_toolchain(cfg: &RawConfigFile) -> Result<()> {
    let tc = &cfg.toolchain;
    if tc.kind == ToolchainKind::External {
        if tc.transpile.as_deref().is_none_or(|s| s.trim().is_empty()) {
            return Err(PipelineError::Config(
                "[toolchain].transpile is required when kind = \"external\"".to_string(),
            ));
        }
        if tc.minify.as_deref().is_none_or(|s| s.trim().is_empty()) {
            return Err(PipelineError::Config(
                "[toolchain].minify is required when kind = \"external\"".to_string(),
            ));
        }
    }
    if let Some(name) = &tc.global_name {
        if !is_identifier(name) {
            return Err(PipelineError::Config(format!(
                "[toolchain].global_name '{name}' is not a valid JavaScript identifier"
            )));
        }
    }
    Ok(())
}

fn validate_lint(cfg: &RawConfigFile) -> Result<()> {
    for rule in cfg.lint.disable.iter() {
        if !RULE_NAMES.contains(&rule.as_str()) {
            return Err(PipelineError::Config(format!(
                "[lint].disable names unknown rule '{}' (known: {})",
                rule,
                RULE_NAMES.join(", ")
            )));
        }
    }
    Ok(())
}

/// Drop `.` components and trailing slashes so `./src/` compares equal to `src`.
fn normalized(p: &str) -> PathBuf {
    Path::new(p)
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::RawConfigFile;

    fn raw(toml_src: &str) -> RawConfigFile {
        toml::from_str(toml_src).unwrap()
    }

    #[test]
    fn defaults_are_valid() {
        assert!(ConfigFile::try_from(RawConfigFile::default()).is_ok());
    }

    #[test]
    fn nested_dist_is_rejected() {
        let err = ConfigFile::try_from(raw("[layout]\ndist = \"src/out\"\n")).unwrap_err();
        assert!(matches!(err, PipelineError::Config(msg) if msg.contains("contain each other")));
    }

    #[test]
    fn entry_outside_src_is_rejected() {
        let err = ConfigFile::try_from(raw("[layout]\nentry = \"lib/index.js\"\n")).unwrap_err();
        assert!(matches!(err, PipelineError::Config(msg) if msg.contains("entry")));
    }

    #[test]
    fn dot_prefixed_paths_compare_normalized() {
        let cfg = raw("[layout]\nsrc = \"./src/\"\nentry = \"src/main.js\"\n");
        assert!(ConfigFile::try_from(cfg).is_ok());
    }

    #[test]
    fn external_toolchain_needs_commands() {
        let err = ConfigFile::try_from(raw(
            "[toolchain]\nkind = \"external\"\ntranspile = \"npx rollup {input}\"\n",
        ))
        .unwrap_err();
        assert!(matches!(err, PipelineError::Config(msg) if msg.contains("minify")));
    }

    #[test]
    fn unknown_lint_rule_is_rejected() {
        let err = ConfigFile::try_from(raw("[lint]\ndisable = [\"semi\"]\n")).unwrap_err();
        assert!(matches!(err, PipelineError::Config(msg) if msg.contains("semi")));
    }

    #[test]
    fn bad_global_name_is_rejected() {
        assert!(ConfigFile::try_from(raw("[toolchain]\nglobal_name = \"my-app\"\n")).is_err());
    }
}
