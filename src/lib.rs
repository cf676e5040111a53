// src/lib.rs

pub mod banner;
pub mod cli;
pub mod config;
pub mod entry;
pub mod errors;
pub mod fs;
pub mod layout;
pub mod logging;
pub mod orchestrator;
pub mod pipeline;
pub mod toolchain;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cli::{CliArgs, Command};
use crate::config::load_or_default;
use crate::fs::{FileSystem, RealFileSystem};
use crate::orchestrator::{run_plan, Step, StepGraph};
use crate::pipeline::Pipeline;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config and project metadata loading
/// - the step plan for the requested command
/// - the shared pipeline (filesystem + toolchain)
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = args.config.as_deref().map(Path::new);
    let cfg = load_or_default(config_path)?;
    let root = project_root(config_path)?;

    let command = args.command();
    let steps = StepGraph::standard().plan(command)?;

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let pipeline = Pipeline::from_config(&root, &cfg, fs)?;

    if args.dry_run {
        print_dry_run(&pipeline, command, &steps);
        return Ok(());
    }

    info!(command = ?command, root = %root.display(), "starting");
    run_plan(Arc::new(pipeline), &steps).await?;
    Ok(())
}

/// The directory holding the config file, or the working directory for a
/// bare file name / no config. Canonicalized so watcher paths line up.
pub fn project_root(config_path: Option<&Path>) -> Result<PathBuf> {
    let root = match config_path.and_then(Path::parent) {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().context("resolving current directory")?,
    };
    root.canonicalize()
        .with_context(|| format!("resolving project root {:?}", root))
}

/// Print what would run, without touching the filesystem.
fn print_dry_run(pipeline: &Pipeline, command: Command, steps: &[Step]) {
    print!("{}", dry_run_report(pipeline, command, steps));
    debug!("dry-run complete (no execution)");
}

/// Layout, toolchain and step plan as shown by `--dry-run`.
pub fn dry_run_report(pipeline: &Pipeline, command: Command, steps: &[Step]) -> String {
    let layout = pipeline.layout();
    let meta = pipeline.metadata();
    let opts = pipeline.options();
    let names: Vec<String> = steps.iter().map(ToString::to_string).collect();

    let mut out = String::new();
    out.push_str("buildpipe dry-run\n");
    out.push_str(&format!("  project = {} v{}\n", meta.name, meta.version));
    out.push_str(&format!("  root    = {}\n", layout.root.display()));
    out.push_str(&format!("  src     = {}\n", layout.src.display()));
    out.push_str(&format!("  dist    = {}\n", layout.dist.display()));
    out.push_str(&format!("  entry   = {}\n\n", layout.entry.display()));
    out.push_str(&format!("  toolchain   = {}\n", pipeline.toolchain().kind()));
    out.push_str(&format!("  global_name = {}\n", opts.global_name));
    out.push_str(&format!("  clean       = {:?}\n", opts.clean_mode));
    out.push_str(&format!("  use_hash    = {}\n\n", opts.use_hash));
    out.push_str(&format!("command {command:?}: {}\n", names.join(" -> ")));
    out
}
