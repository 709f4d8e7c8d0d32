// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::RawConfigFile;

/// Command-line arguments for `linkwatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "linkwatch",
    version,
    about = "Watch a site source tree, following symlinked directories, and rebuild on change.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Linkwatch.toml` in the current working directory. May be
    /// absent when `--source` is given.
    #[arg(long, value_name = "PATH", default_value = "Linkwatch.toml")]
    pub config: String,

    /// Primary source directory (overrides `[watch].source`).
    #[arg(long, value_name = "DIR")]
    pub source: Option<PathBuf>,

    /// Directory to scan for symlinked subdirectories. Repeatable; replaces
    /// `[watch].symlink_roots`.
    #[arg(long = "symlink-root", value_name = "DIR")]
    pub symlink_roots: Vec<PathBuf>,

    /// Extra path to watch. Repeatable; appended to `[watch].extra_paths`.
    #[arg(long = "extra-path", value_name = "PATH")]
    pub extra_paths: Vec<PathBuf>,

    /// Re-scan periodically instead of using native notifications.
    #[arg(long)]
    pub force_polling: bool,

    /// Quiet period in milliseconds before rebuilding.
    #[arg(long, value_name = "MS")]
    pub debounce_ms: Option<u64>,

    /// Shell command to run on change (overrides `[build].cmd`).
    #[arg(long, value_name = "CMD")]
    pub build_cmd: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `LINKWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve and print the directories that would be watched, then exit.
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    /// Apply command-line overrides on top of the file configuration.
    pub fn apply_overrides(&self, raw: &mut RawConfigFile) {
        if let Some(source) = &self.source {
            raw.watch.source = source.clone();
        }
        if !self.symlink_roots.is_empty() {
            raw.watch.symlink_roots = self.symlink_roots.clone();
        }
        raw.watch.extra_paths.extend(self.extra_paths.iter().cloned());
        if self.force_polling {
            raw.watch.force_polling = true;
        }
        if let Some(ms) = self.debounce_ms {
            raw.watch.debounce_ms = ms;
        }
        if let Some(cmd) = &self.build_cmd {
            raw.build.cmd = Some(cmd.clone());
        }
    }
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
