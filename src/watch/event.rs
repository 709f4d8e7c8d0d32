// src/watch/event.rs

//! Normalised change events flowing from the notification backend into
//! the dispatcher loop.

use std::path::{Path, PathBuf};

use notify::event::{ModifyKind, RenameMode};
use notify::EventKind;
use tokio::time::Instant;

/// What happened to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Created,
    Modified,
    Deleted,
}

impl ChangeKind {
    /// Map a `notify` event kind onto a change kind.
    ///
    /// Access events and backend-specific "other" events carry no content
    /// change and map to `None`. A rename's source side counts as a
    /// deletion of the old name.
    pub fn from_event_kind(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Create(_) => Some(ChangeKind::Created),
            EventKind::Remove(_) => Some(ChangeKind::Deleted),
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Some(ChangeKind::Deleted),
            EventKind::Modify(_) | EventKind::Any => Some(ChangeKind::Modified),
            EventKind::Access(_) | EventKind::Other => None,
        }
    }
}

/// A single filesystem notification for a single path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
    /// When the dispatcher side received the notification.
    pub at: Instant,
}

impl ChangeEvent {
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
            at: Instant::now(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Message delivered to the dispatcher loop by an event source.
#[derive(Debug, Clone)]
pub enum WatchSignal {
    Changed(ChangeEvent),
    /// The backend reported an error, optionally naming affected paths.
    Failed { paths: Vec<PathBuf>, reason: String },
}

/// Split a raw `notify` callback result into per-path signals.
pub fn signals_from_notify(res: notify::Result<notify::Event>) -> Vec<WatchSignal> {
    match res {
        Ok(event) => {
            let Some(kind) = ChangeKind::from_event_kind(&event.kind) else {
                return Vec::new();
            };
            let at = Instant::now();
            event
                .paths
                .into_iter()
                .map(|path| WatchSignal::Changed(ChangeEvent { path, kind, at }))
                .collect()
        }
        Err(err) => vec![WatchSignal::Failed {
            reason: err.to_string(),
            paths: err.paths,
        }],
    }
}
