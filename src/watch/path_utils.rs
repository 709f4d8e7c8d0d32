// src/watch/path_utils.rs

//! Path helpers for matching event paths against source-relative globs.

use std::path::Path;

/// `path` relative to `root`, rendered with forward slashes, or `None`
/// when `path` is not under `root`. Purely lexical.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(root).ok().map(slashed)
}

/// Render a path with forward slashes regardless of platform.
pub fn slashed(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
