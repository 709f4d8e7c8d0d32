// src/engine/mod.rs

//! Orchestration for a watch session.
//!
//! This module ties together:
//! - resolved settings derived from the config file ([`WatchSettings`])
//! - the directory resolver plus the missing-root policy ([`resolution`])
//! - the dispatcher lifecycle, including stop / re-resolve / restart when
//!   a new symlinked directory appears ([`session`])

use std::path::{Path, PathBuf};

use crate::config::ConfigFile;
use crate::types::MissingRootPolicy;
use crate::watch::DispatchOptions;

pub mod resolution;
pub mod session;

pub use resolution::resolve_with_policy;
pub use session::{SessionSummary, WatchSession};

/// Fully resolved, absolute-path view of the `[watch]` configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchSettings {
    pub source: PathBuf,
    pub symlink_roots: Vec<PathBuf>,
    pub extra_paths: Vec<PathBuf>,
    pub missing_symlink_root: MissingRootPolicy,
    pub restart_on_new_symlink: bool,
    pub dispatch: DispatchOptions,
}

impl WatchSettings {
    /// Anchor the configured paths.
    ///
    /// `source` is joined onto `base_dir` (the config file's directory);
    /// symlink roots and extra paths are joined onto the resulting source.
    /// Absolute paths are kept as they are.
    pub fn from_config(cfg: &ConfigFile, base_dir: &Path) -> Self {
        let source = base_dir.join(&cfg.watch.source);
        let symlink_roots = cfg
            .watch
            .symlink_roots
            .iter()
            .map(|p| source.join(p))
            .collect();
        let extra_paths = cfg
            .watch
            .extra_paths
            .iter()
            .map(|p| source.join(p))
            .collect();

        Self {
            source,
            symlink_roots,
            extra_paths,
            missing_symlink_root: cfg.watch.missing_symlink_root,
            restart_on_new_symlink: cfg.watch.restart_on_new_symlink,
            dispatch: DispatchOptions {
                debounce: cfg.debounce(),
                mode: cfg.watch_mode(),
                poll_interval: cfg.poll_interval(),
                report_new_symlinks: cfg.watch.restart_on_new_symlink,
            },
        }
    }
}
