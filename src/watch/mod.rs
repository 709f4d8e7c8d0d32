// src/watch/mod.rs

//! File watching and change dispatch.
//!
//! This module is responsible for:
//! - Wiring up a cross-platform filesystem watcher (`notify`), native or
//!   polling, over a resolved [`WatchRootSet`](crate::resolve::WatchRootSet).
//! - Filtering changes through an [`IgnorePredicate`].
//! - Coalescing bursts of changes and invoking the rebuild hook once per
//!   burst, never concurrently.
//!
//! It does **not** decide which directories to watch; that is the job of
//! [`crate::resolve`].

pub mod burst;
pub mod dispatcher;
pub mod event;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use burst::{Debouncer, PendingBurst};
pub use dispatcher::{
    spawn_dispatcher, spawn_with_source, DispatchHandle, DispatchNotice, DispatchOptions,
    NoticeReceiver, DEFAULT_DEBOUNCE, DEFAULT_POLL_INTERVAL,
};
pub use event::{ChangeEvent, ChangeKind, WatchSignal};
pub use patterns::{GlobIgnore, IgnorePredicate};
pub use watcher::{subscribe, Subscription};
