use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;

use linkwatch::errors::LinkwatchError;
use linkwatch::exec::{RebuildFuture, RebuildHook};
use linkwatch::watch::PendingBurst;

/// One observed rebuild call.
#[derive(Debug, Clone)]
pub struct RebuildCall {
    pub started: Instant,
    pub finished: Instant,
    pub paths: Vec<PathBuf>,
}

/// Shared view of everything a [`RecordingRebuild`] has seen.
#[derive(Debug, Clone, Default)]
pub struct RebuildLog {
    calls: Arc<Mutex<Vec<RebuildCall>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    done: Arc<Notify>,
}

impl RebuildLog {
    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<RebuildCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Highest number of rebuilds observed running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Wait until at least `n` rebuilds have completed.
    pub async fn wait_for(&self, n: usize) {
        loop {
            if self.count() >= n {
                return;
            }
            self.done.notified().await;
        }
    }
}

/// A fake rebuild hook that:
/// - records when it was called and with which paths
/// - optionally sleeps to simulate a slow build
/// - tracks concurrent entries so tests can assert serialization.
pub struct RecordingRebuild {
    log: RebuildLog,
    delay: Duration,
}

impl RecordingRebuild {
    pub fn new() -> (Self, RebuildLog) {
        Self::with_delay(Duration::ZERO)
    }

    pub fn with_delay(delay: Duration) -> (Self, RebuildLog) {
        let log = RebuildLog::default();
        (
            Self {
                log: log.clone(),
                delay,
            },
            log,
        )
    }
}

impl RebuildHook for RecordingRebuild {
    fn rebuild<'a>(&'a mut self, burst: &'a PendingBurst) -> RebuildFuture<'a> {
        Box::pin(async move {
            let started = Instant::now();
            tracing::debug!(paths = burst.path_count(), "fake rebuild started");
            let now_running = self.log.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.log
                .max_in_flight
                .fetch_max(now_running, Ordering::SeqCst);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            self.log.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.log.calls.lock().unwrap().push(RebuildCall {
                started,
                finished: Instant::now(),
                paths: burst.paths().map(|p| p.to_path_buf()).collect(),
            });
            self.log.done.notify_one();
            Ok(())
        })
    }
}

/// A hook whose every call fails, counting attempts.
pub struct FailingRebuild {
    attempts: Arc<AtomicUsize>,
}

impl FailingRebuild {
    pub fn new() -> (Self, Arc<AtomicUsize>) {
        let attempts = Arc::new(AtomicUsize::new(0));
        (
            Self {
                attempts: Arc::clone(&attempts),
            },
            attempts,
        )
    }
}

impl RebuildHook for FailingRebuild {
    fn rebuild<'a>(&'a mut self, burst: &'a PendingBurst) -> RebuildFuture<'a> {
        Box::pin(async move {
            let n = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            Err(LinkwatchError::Other(anyhow::anyhow!(
                "build #{n} failed ({} paths)",
                burst.path_count()
            )))
        })
    }
}
