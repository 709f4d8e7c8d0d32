// src/watch/watcher.rs

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, PollWatcher, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::errors::Result;
use crate::resolve::WatchRootSet;
use crate::types::WatchMode;
use crate::watch::event::{signals_from_notify, WatchSignal};

/// Live OS-level subscription over a set of watch roots.
///
/// Dropping the subscription stops all notifications.
pub struct Subscription {
    inner: Box<dyn Watcher + Send>,
    watched: BTreeSet<PathBuf>,
    mode: WatchMode,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("mode", &self.mode)
            .field("watched", &self.watched)
            .finish_non_exhaustive()
    }
}

impl Subscription {
    pub fn mode(&self) -> WatchMode {
        self.mode
    }

    pub fn is_watching(&self, path: &Path) -> bool {
        self.watched.contains(path)
    }

    /// Stop watching a single root; other roots are unaffected.
    ///
    /// Unknown paths are a no-op. The backend may already have dropped the
    /// watch (e.g. the directory was deleted), so its error is returned for
    /// the caller to log rather than acted upon.
    pub fn unwatch(&mut self, path: &Path) -> Result<()> {
        if !self.watched.remove(path) {
            return Ok(());
        }
        debug!(root = %path.display(), "unwatching root");
        self.inner.unwatch(path)?;
        Ok(())
    }
}

/// Subscribe to changes under every root in `roots`.
///
/// Each root is watched recursively without descending through symlinks
/// found below it, so a change behind a link is reported once, under the
/// link's own root. Notifications are converted into
/// [`WatchSignal`]s on the backend's own thread and forwarded into
/// `signal_tx`, so the dispatcher loop is their only consumer.
///
/// - `WatchMode::Native` uses the platform's recommended watcher.
/// - `WatchMode::Polling` re-scans every root each `poll_interval`.
pub fn subscribe(
    roots: &WatchRootSet,
    mode: WatchMode,
    poll_interval: Duration,
    signal_tx: mpsc::UnboundedSender<WatchSignal>,
) -> Result<Subscription> {
    // Closure called synchronously by notify whenever an event arrives.
    let handler = move |res: notify::Result<notify::Event>| {
        for signal in signals_from_notify(res) {
            if signal_tx.send(signal).is_err() {
                // Dispatcher is gone; nothing left to deliver to.
                break;
            }
        }
    };

    // Every linked directory is already a root of its own.
    let config = Config::default().with_follow_symlinks(false);
    let mut inner: Box<dyn Watcher + Send> = match mode {
        WatchMode::Native => Box::new(RecommendedWatcher::new(handler, config)?),
        WatchMode::Polling => Box::new(PollWatcher::new(
            handler,
            config.with_poll_interval(poll_interval),
        )?),
    };

    let mut watched = BTreeSet::new();
    for root in roots {
        inner.watch(&root.path, RecursiveMode::Recursive)?;
        info!(root = %root.path.display(), origin = %root.origin, ?mode, "watching");
        watched.insert(root.path.clone());
    }

    Ok(Subscription {
        inner,
        watched,
        mode,
    })
}
