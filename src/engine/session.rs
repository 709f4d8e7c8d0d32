// src/engine/session.rs

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::time::Instant;
use tracing::{info, warn};

use crate::engine::{resolve_with_policy, WatchSettings};
use crate::errors::Result;
use crate::exec::{RebuildHook, SharedRebuild};
use crate::fs::{FileSystem, RealFileSystem};
use crate::resolve::WatchRootSet;
use crate::watch::{spawn_dispatcher, DispatchNotice, IgnorePredicate, PendingBurst};

/// Counters describing how a session ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Times the dispatcher was restarted with a freshly resolved set.
    pub restarts: usize,
    /// `DispatchNotice::Lost` notices received.
    pub lost_notices: usize,
}

/// A long-running watch: resolve, dispatch, and re-resolve when the set
/// of symlinked directories changes.
///
/// The ignore predicate and rebuild hook are injected once and reused by
/// every dispatcher the session starts.
pub struct WatchSession<R> {
    settings: WatchSettings,
    fs: Arc<dyn FileSystem>,
    ignored: Arc<dyn IgnorePredicate>,
    rebuild: SharedRebuild<R>,
}

impl<R> std::fmt::Debug for WatchSession<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchSession")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<R: RebuildHook + 'static> WatchSession<R> {
    pub fn new(settings: WatchSettings, ignored: Arc<dyn IgnorePredicate>, rebuild: R) -> Self {
        Self {
            settings,
            fs: Arc::new(RealFileSystem),
            ignored,
            rebuild: SharedRebuild::new(rebuild),
        }
    }

    /// Resolve against a different filesystem (the dispatcher itself
    /// always subscribes to the real one).
    pub fn with_fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn settings(&self) -> &WatchSettings {
        &self.settings
    }

    /// Resolve the current watch set under the configured policy.
    pub fn resolve(&self) -> Result<WatchRootSet> {
        resolve_with_policy(self.fs.as_ref(), &self.settings)
    }

    /// Invoke the rebuild hook once with the given paths, outside any
    /// dispatcher (used for the startup build).
    pub async fn rebuild_now(&self, paths: Vec<PathBuf>) -> Result<()> {
        let burst = PendingBurst::from_paths(paths, Instant::now());
        let mut hook = self.rebuild.clone();
        hook.rebuild(&burst).await
    }

    /// Watch until `shutdown` completes or the dispatcher exits on its own.
    ///
    /// When a symlinked directory is created and
    /// `restart_on_new_symlink` is set, the running dispatcher is stopped
    /// (its pending burst is dropped), the set is resolved again from
    /// scratch, a new dispatcher is started, and one rebuild runs for the
    /// new link so its content is picked up.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<SessionSummary>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut summary = SessionSummary::default();
        let mut new_link: Option<PathBuf> = None;

        loop {
            let roots = self.resolve()?;
            let (handle, mut notices) = spawn_dispatcher(
                &roots,
                Arc::clone(&self.ignored),
                self.rebuild.clone(),
                self.settings.dispatch,
            )?;

            // Built only after the new dispatcher is subscribed, so changes
            // made during this build still open a burst.
            if let Some(path) = new_link.take() {
                if let Err(err) = self.rebuild_now(vec![path]).await {
                    warn!(error = %err, "rebuild after new symlink failed");
                }
            }

            let added = loop {
                tokio::select! {
                    _ = &mut shutdown => {
                        info!("shutdown requested; stopping watcher");
                        handle.stop().await;
                        return Ok(summary);
                    }
                    notice = notices.recv() => match notice {
                        Some(DispatchNotice::SymlinkAdded(path)) if self.settings.restart_on_new_symlink => {
                            break Some(path);
                        }
                        Some(DispatchNotice::SymlinkAdded(path)) => {
                            info!(path = %path.display(), "new symlinked directory (restart disabled)");
                        }
                        Some(DispatchNotice::Lost(err)) => {
                            summary.lost_notices += 1;
                            warn!(error = %err, "continuing with remaining roots");
                        }
                        None => break None,
                    },
                }
            };

            handle.stop().await;

            let Some(path) = added else {
                info!("dispatcher exited");
                return Ok(summary);
            };

            summary.restarts += 1;
            info!(
                path = %path.display(),
                restarts = summary.restarts,
                "re-resolving watch roots"
            );
            new_link = Some(path);
        }
    }
}
