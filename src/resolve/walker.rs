// src/resolve/walker.rs

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{trace, warn};

use crate::errors::Result;
use crate::fs::FileSystem;

/// Depth-first walker that collects symlinked directories.
///
/// Directories are always read through their canonical path, and each
/// canonical directory is read at most once for the lifetime of the walker.
/// That bounds the work by the number of distinct directories and makes
/// link cycles terminate. Links found inside a directory are reported
/// under that directory's canonical path.
#[derive(Debug)]
pub struct SymlinkWalker<'a> {
    fs: &'a dyn FileSystem,
    visited: HashSet<PathBuf>,
}

impl<'a> SymlinkWalker<'a> {
    pub fn new(fs: &'a dyn FileSystem) -> Self {
        Self {
            fs,
            visited: HashSet::new(),
        }
    }

    /// Walk `root` and return every symlinked directory reachable from it,
    /// including `root` itself when it is one.
    ///
    /// A root that is a plain file yields nothing. A directory below the
    /// root that cannot be read is logged and skipped; only a failure on
    /// the root itself is an error.
    pub fn discover(&mut self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut found = Vec::new();

        if self.fs.is_symlinked_dir(root) {
            found.push(root.to_path_buf());
        }
        if !self.fs.is_dir(root) {
            return Ok(found);
        }

        let mut stack = vec![root.to_path_buf()];
        while let Some(dir) = stack.pop() {
            let canonical = match self.fs.canonicalize(&dir) {
                Ok(canonical) => canonical,
                Err(err) if dir != root => {
                    warn!(dir = %dir.display(), error = %err, "skipping unreadable directory");
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            if !self.visited.insert(canonical.clone()) {
                trace!(dir = %dir.display(), "already walked; skipping");
                continue;
            }

            let mut entries = match self.fs.read_dir(&canonical) {
                Ok(entries) => entries,
                Err(err) if dir != root => {
                    warn!(dir = %dir.display(), error = %err, "skipping unreadable directory");
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            entries.sort();
            // Reversed so the stack pops entries in sorted order.
            for entry in entries.into_iter().rev() {
                if self.fs.is_symlinked_dir(&entry) {
                    trace!(link = %entry.display(), "found symlinked directory");
                    found.push(entry.clone());
                    stack.push(entry);
                } else if self.fs.is_dir(&entry) {
                    stack.push(entry);
                }
            }
        }

        Ok(found)
    }

    /// Number of distinct directories read so far.
    pub fn visited(&self) -> usize {
        self.visited.len()
    }
}
