// src/watch/patterns.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::watch::path_utils::{relative_str, slashed};

/// Predicate deciding whether a changed path should be dropped before it
/// reaches the debouncer.
///
/// Implemented for any `Fn(&Path) -> bool`, so tests and embedders can
/// pass a closure. Implementations must be pure: the dispatcher may call
/// them any number of times for the same path.
pub trait IgnorePredicate: Send + Sync {
    fn is_ignored(&self, path: &Path) -> bool;
}

impl<F> IgnorePredicate for F
where
    F: Fn(&Path) -> bool + Send + Sync,
{
    fn is_ignored(&self, path: &Path) -> bool {
        self(path)
    }
}

/// Compiled ignore globs, evaluated relative to a base directory.
///
/// ```toml
/// [watch]
/// ignore = ["_site/**", "**/*.swp"]
/// ```
///
/// Paths under `base` are matched by their relative form (e.g.
/// `"_site/index.html"`). Paths outside it, such as files under a
/// symlinked directory's target, are matched by their full path, so only
/// patterns starting with `**/` apply to them.
///
/// The canonical form of `base` is taken once at construction, so events
/// reported under a different spelling of the same directory (macOS gives
/// `/private/var/...` for `/var/...`) still match. Matching itself never
/// touches the filesystem.
#[derive(Clone)]
pub struct GlobIgnore {
    base: PathBuf,
    canonical_base: Option<PathBuf>,
    patterns: Vec<String>,
    set: GlobSet,
}

impl fmt::Debug for GlobIgnore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobIgnore")
            .field("base", &self.base)
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl GlobIgnore {
    pub fn new(base: impl Into<PathBuf>, patterns: &[String]) -> Result<Self> {
        let set = build_globset(patterns).context("building ignore globset")?;
        let base = base.into();
        // A base that does not exist yet is only matched literally.
        let canonical_base = base.canonicalize().ok().filter(|c| *c != base);
        Ok(Self {
            base,
            canonical_base,
            patterns: patterns.to_vec(),
            set,
        })
    }

    /// An ignore set that matches nothing.
    pub fn none(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            canonical_base: None,
            patterns: Vec::new(),
            set: GlobSet::empty(),
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

impl IgnorePredicate for GlobIgnore {
    fn is_ignored(&self, path: &Path) -> bool {
        if self.set.is_empty() {
            return false;
        }
        let rel = relative_str(&self.base, path).or_else(|| {
            self.canonical_base
                .as_deref()
                .and_then(|base| relative_str(base, path))
        });
        match rel {
            Some(rel) => self.set.is_match(rel.as_str()),
            None => self.set.is_match(slashed(path).as_str()),
        }
    }
}

/// Build a GlobSet from simple string patterns.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat)
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
