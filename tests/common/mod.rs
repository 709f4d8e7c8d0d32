// tests/common/mod.rs
#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use linkwatch::resolve::{WatchOrigin, WatchRootSet};
use linkwatch::watch::{ChangeEvent, ChangeKind, IgnorePredicate, WatchSignal};

pub use linkwatch_test_utils::builders;
pub use linkwatch_test_utils::fake_rebuild;
pub use linkwatch_test_utils::init_tracing;

pub fn changed(path: &str, kind: ChangeKind) -> WatchSignal {
    WatchSignal::Changed(ChangeEvent::new(path, kind))
}

pub fn modified(path: &str) -> WatchSignal {
    changed(path, ChangeKind::Modified)
}

/// Build a root set directly, bypassing the resolver.
pub fn roots(entries: &[(&str, WatchOrigin)]) -> WatchRootSet {
    let mut set = WatchRootSet::new();
    for (path, origin) in entries {
        set.insert(*path, *origin);
    }
    set
}

pub fn ignore_nothing() -> Arc<dyn IgnorePredicate> {
    Arc::new(|_: &Path| false)
}

/// Ignore everything under `prefix`.
pub fn ignore_under(prefix: &'static str) -> Arc<dyn IgnorePredicate> {
    Arc::new(move |p: &Path| p.starts_with(prefix))
}
