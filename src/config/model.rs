// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::types::{MissingRootPolicy, WatchMode};

/// Configuration exactly as deserialized from TOML, before validation.
///
/// ```toml
/// [watch]
/// source = "."
/// symlink_roots = ["_posts"]
/// extra_paths = []
/// force_polling = false
/// debounce_ms = 100
/// ignore = ["_site", "_site/**"]
///
/// [build]
/// cmd = "bundle exec jekyll build"
/// ```
///
/// All sections are optional and have reasonable defaults. Use
/// `ConfigFile::try_from` to validate.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    /// What to watch, from `[watch]`.
    #[serde(default)]
    pub watch: WatchSection,

    /// What to run on change, from `[build]`.
    #[serde(default)]
    pub build: BuildSection,
}

/// Validated configuration. Only obtainable through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub watch: WatchSection,
    pub build: BuildSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(watch: WatchSection, build: BuildSection) -> Self {
        Self { watch, build }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.watch.debounce_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.watch.poll_interval_ms)
    }

    pub fn watch_mode(&self) -> WatchMode {
        WatchMode::from_force_polling(self.watch.force_polling)
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// Primary source directory. Relative paths are resolved against the
    /// directory containing the config file.
    #[serde(default = "default_source")]
    pub source: PathBuf,

    /// Directories scanned for nested symlinked directories. Relative
    /// paths are resolved against `source`.
    #[serde(default = "default_symlink_roots")]
    pub symlink_roots: Vec<PathBuf>,

    /// Additional literal paths to watch. Relative paths are resolved
    /// against `source`.
    #[serde(default)]
    pub extra_paths: Vec<PathBuf>,

    /// Re-scan periodically instead of using native notifications.
    #[serde(default)]
    pub force_polling: bool,

    /// Quiet period after the last change before rebuilding.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Re-scan interval when polling.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Glob patterns (relative to `source`) whose changes never trigger a
    /// rebuild.
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,

    /// `"error"` (default) or `"warn"`.
    #[serde(default)]
    pub missing_symlink_root: MissingRootPolicy,

    /// Re-resolve and restart watching when a new symlinked directory
    /// shows up.
    #[serde(default = "default_true")]
    pub restart_on_new_symlink: bool,
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            source: default_source(),
            symlink_roots: default_symlink_roots(),
            extra_paths: Vec::new(),
            force_polling: false,
            debounce_ms: default_debounce_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            ignore: default_ignore(),
            missing_symlink_root: MissingRootPolicy::default(),
            restart_on_new_symlink: true,
        }
    }
}

/// `[build]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildSection {
    /// Shell command run on every flush. Without it changes are only
    /// logged.
    #[serde(default)]
    pub cmd: Option<String>,

    /// Run the build once before watching starts.
    #[serde(default = "default_true")]
    pub run_on_start: bool,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            cmd: None,
            run_on_start: true,
        }
    }
}

fn default_source() -> PathBuf {
    PathBuf::from(".")
}

fn default_symlink_roots() -> Vec<PathBuf> {
    vec![PathBuf::from("_posts")]
}

fn default_debounce_ms() -> u64 {
    100
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_ignore() -> Vec<String> {
    ["_site", "_site/**", ".jekyll-cache", ".jekyll-cache/**", ".sass-cache/**"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_true() -> bool {
    true
}
