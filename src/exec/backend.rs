// src/exec/backend.rs

//! Pluggable rebuild hook abstraction.
//!
//! The dispatcher talks to a `RebuildHook` instead of spawning a build
//! itself. Production uses [`CommandRebuild`](super::CommandRebuild) (run a
//! shell command) or [`LogRebuild`]; tests provide hooks that record calls
//! or sleep to simulate a slow build.
//!
//! Hooks take `&mut self` and the dispatcher awaits each call to
//! completion before reading further events, so a hook is never entered
//! concurrently with itself.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use crate::errors::Result;
use crate::watch::PendingBurst;

pub type RebuildFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Trait abstracting what happens when a burst of changes is flushed.
pub trait RebuildHook: Send {
    /// Rebuild the site for the given flushed burst.
    ///
    /// An error is logged by the dispatcher and does not stop watching.
    fn rebuild<'a>(&'a mut self, burst: &'a PendingBurst) -> RebuildFuture<'a>;
}

impl RebuildHook for Box<dyn RebuildHook> {
    fn rebuild<'a>(&'a mut self, burst: &'a PendingBurst) -> RebuildFuture<'a> {
        (**self).rebuild(burst)
    }
}

/// Adapter turning a synchronous closure into a [`RebuildHook`].
pub struct FnRebuild<F> {
    f: F,
}

impl<F> FnRebuild<F>
where
    F: FnMut(&PendingBurst) + Send,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> RebuildHook for FnRebuild<F>
where
    F: FnMut(&PendingBurst) + Send,
{
    fn rebuild<'a>(&'a mut self, burst: &'a PendingBurst) -> RebuildFuture<'a> {
        (self.f)(burst);
        Box::pin(async { Ok(()) })
    }
}

/// Shareable handle around a hook, so the same build pipeline survives a
/// dispatcher restart.
///
/// The inner lock is held for the whole rebuild, which keeps calls
/// serialized even if two dispatchers briefly overlap.
pub struct SharedRebuild<R> {
    inner: Arc<Mutex<R>>,
}

impl<R> Clone for SharedRebuild<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: RebuildHook> SharedRebuild<R> {
    pub fn new(hook: R) -> Self {
        Self {
            inner: Arc::new(Mutex::new(hook)),
        }
    }
}

impl<R: RebuildHook + 'static> RebuildHook for SharedRebuild<R> {
    fn rebuild<'a>(&'a mut self, burst: &'a PendingBurst) -> RebuildFuture<'a> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let mut hook = inner.lock().await;
            hook.rebuild(burst).await
        })
    }
}

/// Hook used when no build command is configured: just reports the burst.
#[derive(Debug, Default)]
pub struct LogRebuild;

impl RebuildHook for LogRebuild {
    fn rebuild<'a>(&'a mut self, burst: &'a PendingBurst) -> RebuildFuture<'a> {
        Box::pin(async move {
            let paths: Vec<_> = burst.paths().map(|p| p.display().to_string()).collect();
            info!(?paths, "change detected (no build command configured)");
            Ok(())
        })
    }
}
