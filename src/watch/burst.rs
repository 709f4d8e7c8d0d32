// src/watch/burst.rs

//! Pure debounce state machine.
//!
//! [`Debouncer`] owns the single [`PendingBurst`] and decides when it is
//! due. It has no channels, no timers and performs no IO: callers pass in
//! the current instant and arm their own timer from [`Debouncer::deadline`].
//! This keeps the sliding-window semantics unit-testable without a runtime.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::time::Instant;

use crate::watch::event::ChangeEvent;

/// Qualifying changes accumulated since the last flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingBurst {
    paths: BTreeSet<PathBuf>,
    started_at: Instant,
    last_event_at: Instant,
    events: usize,
}

impl PendingBurst {
    fn open(event: &ChangeEvent, now: Instant) -> Self {
        let mut paths = BTreeSet::new();
        paths.insert(event.path.clone());
        Self {
            paths,
            started_at: now,
            last_event_at: now,
            events: 1,
        }
    }

    /// A burst with no paths, used for the startup build.
    pub fn empty(now: Instant) -> Self {
        Self {
            paths: BTreeSet::new(),
            started_at: now,
            last_event_at: now,
            events: 0,
        }
    }

    /// A burst built directly from known paths, outside the debouncer.
    pub fn from_paths<I>(paths: I, now: Instant) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let paths: BTreeSet<PathBuf> = paths.into_iter().collect();
        let events = paths.len();
        Self {
            paths,
            started_at: now,
            last_event_at: now,
            events,
        }
    }

    fn absorb(&mut self, event: &ChangeEvent, now: Instant) {
        self.paths.insert(event.path.clone());
        self.last_event_at = now;
        self.events += 1;
    }

    /// Distinct paths seen in this burst.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    /// Number of raw events absorbed, including repeats on the same path.
    pub fn event_count(&self) -> usize {
        self.events
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn last_event_at(&self) -> Instant {
        self.last_event_at
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Sliding-window debouncer over a single pending burst.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    pending: Option<PendingBurst>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Add a qualifying event received at `now`.
    ///
    /// Opens a burst if none is pending, otherwise extends the current one
    /// and pushes its deadline out to `now + window`. Returns true when a
    /// new burst was opened.
    pub fn record(&mut self, event: &ChangeEvent, now: Instant) -> bool {
        match &mut self.pending {
            Some(burst) => {
                burst.absorb(event, now);
                false
            }
            None => {
                self.pending = Some(PendingBurst::open(event, now));
                true
            }
        }
    }

    /// Instant at which the pending burst becomes due, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending
            .as_ref()
            .map(|burst| burst.last_event_at + self.window)
    }

    /// Take the pending burst if its window has elapsed at `now`.
    pub fn take_due(&mut self, now: Instant) -> Option<PendingBurst> {
        match self.deadline() {
            Some(deadline) if now >= deadline => self.pending.take(),
            _ => None,
        }
    }

    /// Drop the pending burst without flushing it.
    pub fn discard(&mut self) -> Option<PendingBurst> {
        self.pending.take()
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_none()
    }

    pub fn pending(&self) -> Option<&PendingBurst> {
        self.pending.as_ref()
    }
}
