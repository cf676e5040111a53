// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `buildpipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "buildpipe",
    version,
    about = "Bundle, lint, minify and banner-stamp a JavaScript workspace, once or on every change.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Buildpipe.toml` in the current working directory. When the
    /// default file does not exist, built-in defaults are used.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BUILDPIPE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load config, print the layout and step plan, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Command to run. Defaults to `default` (build, then watch).
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl CliArgs {
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Default)
    }
}

/// Named entry commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Clean the output root, ensure the entry file, compile once.
    #[command(alias = "compile")]
    Build,
    /// Recompile on every change under the source root. No cleaning.
    Watch,
    /// Build, then keep watching.
    Default,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
