// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Same limit Linux applies before failing with `ELOOP`.
const MAX_LINK_HOPS: usize = 40;

#[derive(Debug, Clone)]
pub enum MockEntry {
    File(Vec<u8>),
    Dir(Vec<String>), // List of child names
    /// Link target, absolute or relative to the link's parent directory.
    Symlink(PathBuf),
}

/// In-memory filesystem rooted at `/`, with symlink support.
///
/// All paths are treated as absolute; relative paths are interpreted
/// against `/`.
#[derive(Debug, Clone)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut files = HashMap::new();
        files.insert(PathBuf::from("/"), MockEntry::Dir(Vec::new()));

        Self {
            files: Arc::new(Mutex::new(files)),
        }
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut files = self.files.lock().unwrap();
        ensure_dir_entry(&mut files, &rooted(path.as_ref()));
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        self.insert_entry(path.as_ref(), MockEntry::File(content.into()));
    }

    pub fn add_symlink(&self, link: impl AsRef<Path>, target: impl AsRef<Path>) {
        self.insert_entry(
            link.as_ref(),
            MockEntry::Symlink(target.as_ref().to_path_buf()),
        );
    }

    /// Remove a single entry (not its children) and unlink it from its parent.
    pub fn remove(&self, path: impl AsRef<Path>) {
        let path = rooted(path.as_ref());
        let mut files = self.files.lock().unwrap();
        files.remove(&path);
        if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
            if let Some(MockEntry::Dir(children)) = files.get_mut(parent) {
                let name = name.to_string_lossy();
                children.retain(|c| c.as_str() != name);
            }
        }
    }

    fn insert_entry(&self, path: &Path, entry: MockEntry) {
        let path = rooted(path);
        let mut files = self.files.lock().unwrap();
        if let Some(parent) = path.parent() {
            ensure_dir_entry(&mut files, parent);
            link_child(&mut files, parent, &path);
        }
        files.insert(path, entry);
    }

    /// Walk `path` component by component, following symlinks, and return
    /// the physical path of the entry it names.
    ///
    /// With `follow_last = false` a symlink in the final position is
    /// returned as-is (lstat semantics).
    fn resolve(&self, path: &Path, follow_last: bool) -> Option<PathBuf> {
        let files = self.files.lock().unwrap();

        let mut hops = 0;
        let mut current = PathBuf::from("/");
        let mut rest: Vec<OsString> = Vec::new();
        push_components(&mut rest, path);

        while let Some(name) = rest.pop() {
            if name == ".." {
                current.pop();
                continue;
            }
            let candidate = current.join(&name);
            match files.get(&candidate) {
                Some(MockEntry::Symlink(target)) if follow_last || !rest.is_empty() => {
                    hops += 1;
                    if hops > MAX_LINK_HOPS {
                        return None;
                    }
                    let target = if target.is_absolute() {
                        target.clone()
                    } else {
                        current.join(target)
                    };
                    current = PathBuf::from("/");
                    push_components(&mut rest, &target);
                }
                Some(_) => current = candidate,
                None => return None,
            }
        }

        Some(current)
    }

    fn entry(&self, path: &Path, follow_last: bool) -> Option<MockEntry> {
        let physical = self.resolve(path, follow_last)?;
        let files = self.files.lock().unwrap();
        files.get(&physical).cloned()
    }
}

fn rooted(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        Path::new("/").join(path)
    }
}

/// Push the components of `path` onto `stack` so that popping yields them
/// in order.
fn push_components(stack: &mut Vec<OsString>, path: &Path) {
    for comp in path.components().rev() {
        match comp {
            Component::Normal(name) => stack.push(name.to_os_string()),
            Component::ParentDir => stack.push(OsString::from("..")),
            _ => {}
        }
    }
}

fn ensure_dir_entry(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
    if files.contains_key(path) {
        return;
    }
    files.insert(path.to_path_buf(), MockEntry::Dir(Vec::new()));
    if let Some(parent) = path.parent() {
        if parent != path {
            ensure_dir_entry(files, parent);
            link_child(files, parent, path);
        }
    }
}

fn link_child(files: &mut HashMap<PathBuf, MockEntry>, parent: &Path, child: &Path) {
    if let Some(MockEntry::Dir(children)) = files.get_mut(parent) {
        if let Some(name) = child.file_name().and_then(|n| n.to_str()) {
            if !children.iter().any(|c| c == name) {
                children.push(name.to_string());
            }
        }
    }
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.entry(path, true).is_some()
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.entry(path, true), Some(MockEntry::Dir(_)))
    }

    fn is_symlink(&self, path: &Path) -> bool {
        matches!(self.entry(path, false), Some(MockEntry::Symlink(_)))
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        self.resolve(path, true)
            .ok_or_else(|| anyhow!("No such file or directory: {:?}", path))
    }

    fn absolute(&self, path: &Path) -> Result<PathBuf> {
        Ok(rooted(path))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        match self.entry(path, true) {
            Some(MockEntry::Dir(children)) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}
