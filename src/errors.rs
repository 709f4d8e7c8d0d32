// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LinkwatchError {
    /// A configured symlink root (or the primary source) does not exist.
    #[error("Path not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A configured extra path does not exist.
    #[error("Invalid extra path: {}", .0.display())]
    InvalidPath(PathBuf),

    /// A previously valid watch root can no longer be watched.
    #[error("Watch lost on {}: {reason}", path.display())]
    WatchLost { path: PathBuf, reason: String },

    /// The notification backend failed without naming a path.
    #[error("Watch backend error: {0}")]
    WatchBackend(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, LinkwatchError>;
