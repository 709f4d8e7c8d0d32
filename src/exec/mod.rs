// src/exec/mod.rs

//! Rebuild execution layer.
//!
//! - [`backend`] provides the `RebuildHook` trait the dispatcher calls on
//!   every flush, plus small adapters (`FnRebuild`, `SharedRebuild`,
//!   `LogRebuild`).
//! - [`command`] runs a configured shell command as the rebuild.

pub mod backend;
pub mod command;

pub use backend::{FnRebuild, LogRebuild, RebuildFuture, RebuildHook, SharedRebuild};
pub use command::{BuildOutcome, CommandRebuild};
