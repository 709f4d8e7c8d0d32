#![allow(dead_code)]

use std::path::PathBuf;

use linkwatch::config::{ConfigFile, RawConfigFile};
use linkwatch::fs::mock::MockFileSystem;
use linkwatch::types::MissingRootPolicy;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn source(mut self, path: &str) -> Self {
        self.config.watch.source = PathBuf::from(path);
        self
    }

    /// Replace the default symlink roots with exactly these.
    pub fn symlink_roots(mut self, roots: &[&str]) -> Self {
        self.config.watch.symlink_roots = roots.iter().map(PathBuf::from).collect();
        self
    }

    pub fn extra_path(mut self, path: &str) -> Self {
        self.config.watch.extra_paths.push(PathBuf::from(path));
        self
    }

    pub fn force_polling(mut self, val: bool) -> Self {
        self.config.watch.force_polling = val;
        self
    }

    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.config.watch.debounce_ms = ms;
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.watch.poll_interval_ms = ms;
        self
    }

    pub fn ignore(mut self, pattern: &str) -> Self {
        self.config.watch.ignore.push(pattern.to_string());
        self
    }

    pub fn missing_symlink_root(mut self, policy: MissingRootPolicy) -> Self {
        self.config.watch.missing_symlink_root = policy;
        self
    }

    pub fn restart_on_new_symlink(mut self, val: bool) -> Self {
        self.config.watch.restart_on_new_symlink = val;
        self
    }

    pub fn build_cmd(mut self, cmd: &str) -> Self {
        self.config.build.cmd = Some(cmd.to_string());
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The tree used throughout the resolver tests:
///
/// ```text
/// /proj/src/index.md
/// /proj/src/_posts -> /data/posts
/// /data/posts/hello.md
/// /data/posts/archive -> /archive/2020
/// /archive/2020/old.md
/// ```
pub fn posts_scenario() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_file("/proj/src/index.md", "# home");
    fs.add_file("/data/posts/hello.md", "hello");
    fs.add_file("/archive/2020/old.md", "old");
    fs.add_symlink("/proj/src/_posts", "/data/posts");
    fs.add_symlink("/data/posts/archive", "/archive/2020");
    fs
}
