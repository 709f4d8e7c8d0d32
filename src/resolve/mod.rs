// src/resolve/mod.rs

//! Directory resolution: turn a primary source directory, a list of
//! "symlink roots" and a list of extra paths into the set of directories
//! the dispatcher should watch.
//!
//! Native watchers do not descend through symbolic links, so a source
//! tree whose `_posts` directory is a link into another disk would never
//! see changes under it. The resolver walks each symlink root and records
//! every symlinked directory it can reach, following links through their
//! canonical targets and never descending into the same target twice.
//!
//! Resolution is synchronous and read-only. The resulting [`WatchRootSet`]
//! is immutable; re-resolution always produces a brand new set.

pub mod walker;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::errors::{LinkwatchError, Result};
use crate::fs::{FileSystem, RealFileSystem};

pub use walker::SymlinkWalker;

/// Why a directory ended up in the watch set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WatchOrigin {
    /// The project's primary source directory.
    Primary,
    /// A symlinked directory found beneath a symlink root.
    Discovered,
    /// A literal path from the `extra_paths` configuration.
    Extra,
}

impl fmt::Display for WatchOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WatchOrigin::Primary => "primary",
            WatchOrigin::Discovered => "discovered",
            WatchOrigin::Extra => "extra",
        };
        f.write_str(s)
    }
}

/// A single directory to watch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WatchRoot {
    pub path: PathBuf,
    pub origin: WatchOrigin,
}

impl WatchRoot {
    pub fn new(path: impl Into<PathBuf>, origin: WatchOrigin) -> Self {
        Self {
            path: path.into(),
            origin,
        }
    }
}

/// Deduplicated set of watch roots keyed by absolute path.
///
/// The first origin recorded for a path wins, so a primary source that is
/// also listed as an extra path stays `Primary`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchRootSet {
    roots: BTreeMap<PathBuf, WatchRoot>,
}

impl WatchRootSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `path` with `origin`. Returns false if the path was already
    /// present (the existing origin is kept).
    pub fn insert(&mut self, path: impl Into<PathBuf>, origin: WatchOrigin) -> bool {
        let path = path.into();
        if self.roots.contains_key(&path) {
            return false;
        }
        self.roots
            .insert(path.clone(), WatchRoot::new(path, origin));
        true
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.roots.contains_key(path)
    }

    pub fn origin_of(&self, path: &Path) -> Option<WatchOrigin> {
        self.roots.get(path).map(|r| r.origin)
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Roots in path order.
    pub fn iter(&self) -> impl Iterator<Item = &WatchRoot> {
        self.roots.values()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.roots.keys().map(PathBuf::as_path)
    }

    pub fn with_origin(&self, origin: WatchOrigin) -> impl Iterator<Item = &WatchRoot> {
        self.iter().filter(move |r| r.origin == origin)
    }
}

impl<'a> IntoIterator for &'a WatchRootSet {
    type Item = &'a WatchRoot;
    type IntoIter = std::collections::btree_map::Values<'a, PathBuf, WatchRoot>;

    fn into_iter(self) -> Self::IntoIter {
        self.roots.values()
    }
}

/// Resolve the watch set against the real filesystem.
///
/// See [`resolve_with`].
pub fn resolve(
    primary_source: &Path,
    symlink_roots: &[PathBuf],
    extra_paths: &[PathBuf],
) -> Result<WatchRootSet> {
    resolve_with(&RealFileSystem, primary_source, symlink_roots, extra_paths)
}

/// Resolve the watch set using the given filesystem.
///
/// - `primary_source` is always included (origin `Primary`); it must exist.
/// - Each symlink root must exist, otherwise [`LinkwatchError::NotFound`]
///   naming that root is returned. A root that is itself a symlinked
///   directory is recorded as `Discovered`; every symlinked directory
///   reachable beneath it is recorded as `Discovered` too.
/// - Each extra path must exist, otherwise [`LinkwatchError::InvalidPath`].
///
/// Paths are made absolute but not canonicalized, so a link keeps the
/// name it was found under.
pub fn resolve_with(
    fs: &dyn FileSystem,
    primary_source: &Path,
    symlink_roots: &[PathBuf],
    extra_paths: &[PathBuf],
) -> Result<WatchRootSet> {
    let mut set = WatchRootSet::new();

    let primary = fs.absolute(primary_source)?;
    if !fs.is_dir(&primary) {
        return Err(LinkwatchError::NotFound(primary));
    }
    set.insert(primary, WatchOrigin::Primary);

    let mut walker = SymlinkWalker::new(fs);
    for root in symlink_roots {
        let root = fs.absolute(root)?;
        if !fs.exists(&root) {
            return Err(LinkwatchError::NotFound(root));
        }
        let found = walker.discover(&root)?;
        debug!(root = %root.display(), found = found.len(), "scanned symlink root");
        for path in found {
            set.insert(path, WatchOrigin::Discovered);
        }
    }

    for extra in extra_paths {
        let path = fs.absolute(extra)?;
        if !fs.exists(&path) {
            return Err(LinkwatchError::InvalidPath(extra.clone()));
        }
        set.insert(path, WatchOrigin::Extra);
    }

    info!(
        roots = set.len(),
        discovered = set.with_origin(WatchOrigin::Discovered).count(),
        "resolved watch roots"
    );
    Ok(set)
}
