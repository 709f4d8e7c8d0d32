// src/watch/dispatcher.rs

//! Change dispatcher: the single task that owns the pending burst.
//!
//! Notification backends deliver [`WatchSignal`]s over an unbounded
//! channel. The dispatcher loop is the only reader; it applies the ignore
//! predicate, feeds the [`Debouncer`], and awaits the rebuild hook inline
//! when the burst is due. Because the hook is awaited on the loop itself,
//! rebuilds are strictly serialized and anything arriving meanwhile simply
//! waits in the channel to open the next burst.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::errors::{LinkwatchError, Result};
use crate::exec::RebuildHook;
use crate::fs::{FileSystem, RealFileSystem};
use crate::resolve::WatchRootSet;
use crate::types::WatchMode;
use crate::watch::burst::Debouncer;
use crate::watch::event::{ChangeEvent, ChangeKind, WatchSignal};
use crate::watch::patterns::IgnorePredicate;
use crate::watch::watcher::{subscribe, Subscription};

/// Default debounce window.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Default re-scan interval when polling.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Knobs for a dispatcher instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOptions {
    pub debounce: Duration,
    pub mode: WatchMode,
    /// Only used with `WatchMode::Polling`.
    pub poll_interval: Duration,
    /// Emit [`DispatchNotice::SymlinkAdded`] for newly created symlinked
    /// directories.
    pub report_new_symlinks: bool,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            mode: WatchMode::Native,
            poll_interval: DEFAULT_POLL_INTERVAL,
            report_new_symlinks: false,
        }
    }
}

/// Asynchronous notices surfaced to the owner of a dispatcher.
#[derive(Debug)]
pub enum DispatchNotice {
    /// A watch root (or the backend as a whole) failed. Watching continues
    /// on the remaining roots.
    Lost(LinkwatchError),
    /// A symlinked directory appeared; the root set may be stale.
    SymlinkAdded(PathBuf),
}

pub type NoticeReceiver = mpsc::UnboundedReceiver<DispatchNotice>;

struct Running {
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Handle to a running dispatcher.
///
/// Dropping the handle asks the loop to shut down but does not wait for
/// it; call [`DispatchHandle::stop`] for a synchronous guarantee.
pub struct DispatchHandle {
    running: Mutex<Option<Running>>,
}

impl fmt::Debug for DispatchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchHandle").finish_non_exhaustive()
    }
}

impl DispatchHandle {
    /// Stop the dispatcher.
    ///
    /// Cancels any pending burst without flushing it, unsubscribes from
    /// the backend and waits for the loop task to exit. A rebuild already
    /// in flight is allowed to finish first; once this returns no further
    /// rebuild will start. Repeated calls are no-ops.
    ///
    /// Must not be awaited from inside the rebuild hook of the same
    /// dispatcher, since it waits for that hook to return.
    pub async fn stop(&self) {
        let Some(running) = self.running.lock().await.take() else {
            return;
        };
        let _ = running.shutdown_tx.send(());
        if let Err(err) = running.task.await {
            if err.is_panic() {
                warn!("dispatcher task panicked: {err}");
            }
        }
        debug!("dispatcher stopped");
    }

    /// True until [`stop`](Self::stop) has completed or the loop has
    /// exited on its own.
    pub async fn is_running(&self) -> bool {
        match self.running.lock().await.as_ref() {
            Some(running) => !running.task.is_finished(),
            None => false,
        }
    }
}

impl Drop for DispatchHandle {
    fn drop(&mut self) {
        if let Some(running) = self.running.get_mut().take() {
            let _ = running.shutdown_tx.send(());
        }
    }
}

/// Subscribe to `roots` and start dispatching.
///
/// Must be called from within a Tokio runtime. Fails if the backend cannot
/// be created or a root cannot be watched; after that point every failure
/// is reported through the returned [`NoticeReceiver`].
pub fn spawn_dispatcher<R>(
    roots: &WatchRootSet,
    ignored: Arc<dyn IgnorePredicate>,
    rebuild: R,
    options: DispatchOptions,
) -> Result<(DispatchHandle, NoticeReceiver)>
where
    R: RebuildHook + 'static,
{
    let (signal_tx, signal_rx) = mpsc::unbounded_channel();
    let subscription = subscribe(roots, options.mode, options.poll_interval, signal_tx)?;

    Ok(start_loop(
        signal_rx,
        Some(subscription),
        roots,
        Arc::new(RealFileSystem),
        ignored,
        Box::new(rebuild),
        options,
    ))
}

/// Start dispatching from an arbitrary signal source instead of an OS
/// subscription.
///
/// `options.mode` and `options.poll_interval` are ignored. When every
/// sender of `signals` is dropped the loop flushes any pending burst once
/// it is due and then exits.
pub fn spawn_with_source<R>(
    signals: mpsc::UnboundedReceiver<WatchSignal>,
    roots: &WatchRootSet,
    fs: Arc<dyn FileSystem>,
    ignored: Arc<dyn IgnorePredicate>,
    rebuild: R,
    options: DispatchOptions,
) -> (DispatchHandle, NoticeReceiver)
where
    R: RebuildHook + 'static,
{
    start_loop(signals, None, roots, fs, ignored, Box::new(rebuild), options)
}

fn start_loop(
    signals: mpsc::UnboundedReceiver<WatchSignal>,
    subscription: Option<Subscription>,
    roots: &WatchRootSet,
    fs: Arc<dyn FileSystem>,
    ignored: Arc<dyn IgnorePredicate>,
    rebuild: Box<dyn RebuildHook>,
    options: DispatchOptions,
) -> (DispatchHandle, NoticeReceiver) {
    let (notice_tx, notice_rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let dispatch_loop = DispatchLoop {
        signals,
        source_open: true,
        shutdown_rx,
        subscription,
        roots: roots.paths().map(Path::to_path_buf).collect(),
        fs,
        ignored,
        rebuild,
        debouncer: Debouncer::new(options.debounce),
        report_new_symlinks: options.report_new_symlinks,
        notices: notice_tx,
    };
    let task = tokio::spawn(dispatch_loop.run());

    let handle = DispatchHandle {
        running: Mutex::new(Some(Running { shutdown_tx, task })),
    };
    (handle, notice_rx)
}

struct DispatchLoop {
    signals: mpsc::UnboundedReceiver<WatchSignal>,
    source_open: bool,
    shutdown_rx: oneshot::Receiver<()>,
    /// Dropped together with the loop, which ends the OS subscription.
    subscription: Option<Subscription>,
    /// Roots still being watched.
    roots: BTreeSet<PathBuf>,
    fs: Arc<dyn FileSystem>,
    ignored: Arc<dyn IgnorePredicate>,
    rebuild: Box<dyn RebuildHook>,
    debouncer: Debouncer,
    report_new_symlinks: bool,
    notices: mpsc::UnboundedSender<DispatchNotice>,
}

impl DispatchLoop {
    async fn run(mut self) {
        info!(
            roots = self.roots.len(),
            debounce_ms = self.debouncer.window().as_millis() as u64,
            "dispatcher started"
        );

        loop {
            if !self.source_open && self.debouncer.is_idle() {
                info!("event source closed; dispatcher exiting");
                break;
            }

            let deadline = self.debouncer.deadline();
            let timer = async move {
                match deadline {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                biased;

                _ = &mut self.shutdown_rx => {
                    if let Some(burst) = self.debouncer.discard() {
                        debug!(paths = burst.path_count(), "dropping pending burst on stop");
                    }
                    break;
                }
                signal = self.signals.recv(), if self.source_open => match signal {
                    Some(signal) => self.handle_signal(signal),
                    None => self.source_open = false,
                },
                _ = timer => self.flush().await,
            }
        }

        if let Some(subscription) = self.subscription.take() {
            debug!(?subscription, "releasing subscription");
        }
        debug!("dispatcher loop finished");
    }

    fn handle_signal(&mut self, signal: WatchSignal) {
        match signal {
            WatchSignal::Changed(event) => self.handle_change(event),
            WatchSignal::Failed { paths, reason } => self.handle_failure(paths, reason),
        }
    }

    fn handle_change(&mut self, event: ChangeEvent) {
        if event.kind == ChangeKind::Deleted && self.roots.contains(&event.path) {
            self.lose_root(&event.path, "watch root was removed".to_string());
        }

        if self.ignored.is_ignored(&event.path) {
            trace!(path = %event.path.display(), "ignored change");
            return;
        }

        if self.report_new_symlinks
            && event.kind == ChangeKind::Created
            && self.fs.is_symlinked_dir(&event.path)
        {
            info!(path = %event.path.display(), "new symlinked directory");
            self.notify(DispatchNotice::SymlinkAdded(event.path.clone()));
        }

        let opened = self.debouncer.record(&event, Instant::now());
        debug!(
            path = %event.path.display(),
            kind = ?event.kind,
            opened,
            "qualifying change"
        );
    }

    fn handle_failure(&mut self, paths: Vec<PathBuf>, reason: String) {
        if paths.is_empty() {
            warn!(%reason, "watch backend error");
            self.notify(DispatchNotice::Lost(LinkwatchError::WatchBackend(reason)));
            return;
        }
        for path in paths {
            self.lose_root(&path, reason.clone());
        }
    }

    /// Report `path` as lost and stop watching it if it is one of our roots.
    fn lose_root(&mut self, path: &Path, reason: String) {
        warn!(path = %path.display(), %reason, "watch lost");
        if self.roots.remove(path) {
            if let Some(subscription) = self.subscription.as_mut() {
                if let Err(err) = subscription.unwatch(path) {
                    debug!(path = %path.display(), error = %err, "unwatch after loss failed");
                }
            }
        }
        self.notify(DispatchNotice::Lost(LinkwatchError::WatchLost {
            path: path.to_path_buf(),
            reason,
        }));
    }

    fn notify(&self, notice: DispatchNotice) {
        if let Err(err) = self.notices.send(notice) {
            warn!(notice = ?err.0, "notice receiver dropped; notice not delivered");
        }
    }

    async fn flush(&mut self) {
        let Some(burst) = self.debouncer.take_due(Instant::now()) else {
            return;
        };

        info!(
            paths = burst.path_count(),
            events = burst.event_count(),
            "changes settled; rebuilding"
        );
        let started = Instant::now();
        match self.rebuild.rebuild(&burst).await {
            Ok(()) => debug!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                "rebuild returned"
            ),
            Err(err) => warn!(error = %err, "rebuild failed"),
        }
    }
}
