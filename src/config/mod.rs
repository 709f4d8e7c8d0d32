// src/config/mod.rs

//! Configuration loading and validation for linkwatch.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate basic invariants like non-zero timings (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_or_default};
pub use model::{BuildSection, ConfigFile, RawConfigFile, WatchSection};
pub use validate::validate_raw_config;
