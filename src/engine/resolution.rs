// src/engine/resolution.rs

use tracing::warn;

use crate::engine::WatchSettings;
use crate::errors::{LinkwatchError, Result};
use crate::fs::FileSystem;
use crate::resolve::{resolve_with, WatchRootSet};
use crate::types::MissingRootPolicy;

/// Run the resolver and apply the configured missing-root policy.
///
/// With `MissingRootPolicy::Warn`, each symlink root reported as
/// `NotFound` is logged and dropped, and resolution runs again on the
/// reduced list. A missing primary source or extra path is always an
/// error.
pub fn resolve_with_policy(fs: &dyn FileSystem, settings: &WatchSettings) -> Result<WatchRootSet> {
    let mut symlink_roots = settings.symlink_roots.clone();

    loop {
        let result = resolve_with(fs, &settings.source, &symlink_roots, &settings.extra_paths);
        match result {
            Err(LinkwatchError::NotFound(missing))
                if settings.missing_symlink_root == MissingRootPolicy::Warn =>
            {
                let before = symlink_roots.len();
                symlink_roots.retain(|root| match fs.absolute(root) {
                    Ok(abs) => abs != missing,
                    Err(_) => true,
                });
                if symlink_roots.len() == before {
                    // Not one of the symlink roots: the source itself is gone.
                    return Err(LinkwatchError::NotFound(missing));
                }
                warn!(root = %missing.display(), "symlink root not found; skipping it");
            }
            other => return other,
        }
    }
}
