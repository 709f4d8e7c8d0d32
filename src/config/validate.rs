// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{LinkwatchError, Result};
use crate::watch::patterns::build_globset;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::LinkwatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.watch, raw.build))
    }
}

pub fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_source(cfg)?;
    validate_timing(cfg)?;
    validate_ignore(cfg)?;
    validate_build(cfg)?;
    Ok(())
}

fn validate_source(cfg: &RawConfigFile) -> Result<()> {
    if cfg.watch.source.as_os_str().is_empty() {
        return Err(LinkwatchError::ConfigError(
            "[watch].source must not be empty".to_string(),
        ));
    }
    for root in cfg.watch.symlink_roots.iter() {
        if root.as_os_str().is_empty() {
            return Err(LinkwatchError::ConfigError(
                "[watch].symlink_roots must not contain empty paths".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_timing(cfg: &RawConfigFile) -> Result<()> {
    if cfg.watch.debounce_ms == 0 {
        return Err(LinkwatchError::ConfigError(
            "[watch].debounce_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.watch.poll_interval_ms == 0 {
        return Err(LinkwatchError::ConfigError(
            "[watch].poll_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_ignore(cfg: &RawConfigFile) -> Result<()> {
    build_globset(&cfg.watch.ignore)
        .map_err(|err| LinkwatchError::ConfigError(format!("[watch].ignore: {err:#}")))?;
    Ok(())
}

fn validate_build(cfg: &RawConfigFile) -> Result<()> {
    if let Some(cmd) = &cfg.build.cmd {
        if cmd.trim().is_empty() {
            return Err(LinkwatchError::ConfigError(
                "[build].cmd must not be empty when set".to_string(),
            ));
        }
    }
    Ok(())
}
