// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod resolve;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, error, info, warn};

use crate::cli::CliArgs;
use crate::config::{load_or_default, ConfigFile};
use crate::engine::{WatchSession, WatchSettings};
use crate::exec::{CommandRebuild, LogRebuild, RebuildHook};
use crate::resolve::WatchRootSet;
use crate::watch::{GlobIgnore, IgnorePredicate};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading + CLI overrides
/// - the ignore predicate and rebuild hook
/// - directory resolution (or a dry-run listing)
/// - the watch session
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let mut raw = load_or_default(&config_path, args.source.is_some())?;
    args.apply_overrides(&mut raw);
    let cfg = ConfigFile::try_from(raw)?;

    // A --source given on the command line is relative to where we were
    // started, not to the config file.
    let base_dir = if args.source.is_some() {
        current_dir()
    } else {
        config_root_dir(&config_path)
    };
    let settings = WatchSettings::from_config(&cfg, &base_dir);

    let ignored: Arc<dyn IgnorePredicate> =
        Arc::new(GlobIgnore::new(&settings.source, &cfg.watch.ignore)?);
    let rebuild: Box<dyn RebuildHook> = match &cfg.build.cmd {
        Some(cmd) => Box::new(CommandRebuild::new(cmd.clone(), &settings.source)),
        None => Box::new(LogRebuild),
    };

    let session = WatchSession::new(settings, ignored, rebuild);

    if args.dry_run {
        let roots = session.resolve()?;
        print_dry_run(&cfg, &roots);
        return Ok(());
    }

    if cfg.build.run_on_start {
        info!("running initial build");
        if let Err(err) = session.rebuild_now(Vec::new()).await {
            warn!(error = %err, "initial build failed");
        }
    }

    let summary = session.run_until(shutdown_signal()).await?;
    info!(
        restarts = summary.restarts,
        lost = summary.lost_notices,
        "linkwatch exiting"
    );
    Ok(())
}

/// Completes on Ctrl-C. If the signal handler cannot be installed we keep
/// watching rather than exiting immediately.
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for Ctrl+C: {err}");
        std::future::pending::<()>().await;
    }
}

fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Figure out the directory relative config paths are anchored to.
///
/// - If the config path has a non-empty parent (e.g. "site/Linkwatch.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Linkwatch.toml" (parent = ""),
///   we fall back to the current working directory.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => current_dir(),
    }
}

/// Dry-run output: print the resolved roots and the effective settings.
fn print_dry_run(cfg: &ConfigFile, roots: &WatchRootSet) {
    println!("linkwatch dry-run");
    println!("  watch.force_polling = {}", cfg.watch.force_polling);
    println!("  watch.debounce_ms = {}", cfg.watch.debounce_ms);
    if cfg.watch.force_polling {
        println!("  watch.poll_interval_ms = {}", cfg.watch.poll_interval_ms);
    }
    if !cfg.watch.ignore.is_empty() {
        println!("  watch.ignore = {:?}", cfg.watch.ignore);
    }
    match &cfg.build.cmd {
        Some(cmd) => println!("  build.cmd = {cmd}"),
        None => println!("  build.cmd = (none; changes are only logged)"),
    }
    println!();

    println!("watch roots ({}):", roots.len());
    for root in roots {
        println!("  - {} ({})", root.path.display(), root.origin);
    }

    debug!("dry-run complete (nothing watched)");
}
