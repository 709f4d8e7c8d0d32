use std::str::FromStr;
use serde::Deserialize;

/// What to do when a configured symlink root does not exist.
///
/// - `Error`: abort startup with the resolver's `NotFound` error (default).
/// - `Warn`: log the missing root and resolve again without it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingRootPolicy {
    Error,
    Warn,
}

impl Default for MissingRootPolicy {
    fn default() -> Self {
        MissingRootPolicy::Error
    }
}

impl FromStr for MissingRootPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(MissingRootPolicy::Error),
            "warn" | "warning" => Ok(MissingRootPolicy::Warn),
            other => Err(format!(
                "invalid missing_symlink_root: {other} (expected \"error\" or \"warn\")"
            )),
        }
    }
}

/// How the dispatcher subscribes to filesystem changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchMode {
    /// Native OS notifications (inotify, FSEvents, ReadDirectoryChangesW, ...).
    Native,
    /// Periodic re-scan of every watch root.
    Polling,
}

impl WatchMode {
    pub fn from_force_polling(force_polling: bool) -> Self {
        if force_polling {
            WatchMode::Polling
        } else {
            WatchMode::Native
        }
    }
}

impl Default for WatchMode {
    fn default() -> Self {
        WatchMode::Native
    }
}
