// src/logging.rs

//! Diagnostics go through `tracing`, rendered by a `tracing-subscriber`
//! formatter on stderr. Stdout belongs to the build command.
//!
//! The filter is chosen in this order:
//! 1. `--log-level` (applies to every target)
//! 2. `LINKWATCH_LOG`, either a bare level (`debug`) or full filter
//!    directives (`linkwatch=debug,notify=warn`)
//! 3. `info`

use anyhow::{Context, Result};
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

/// Environment variable consulted when no `--log-level` is given.
pub const LOG_ENV: &str = "LINKWATCH_LOG";

/// Install the global subscriber. Call once, before anything logs.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = match cli_level {
        Some(lvl) => level_filter(Level::from(lvl)),
        None => filter_from_env(std::env::var(LOG_ENV).ok().as_deref())?,
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err))
        .context("installing log subscriber")?;

    Ok(())
}

/// Build the filter for a `LINKWATCH_LOG` value (unset or blank means `info`).
pub fn filter_from_env(value: Option<&str>) -> Result<EnvFilter> {
    let Some(raw) = value.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(EnvFilter::new("info"));
    };
    if let Some(level) = parse_level_str(raw) {
        return Ok(level_filter(level));
    }
    EnvFilter::try_new(raw).with_context(|| format!("invalid {LOG_ENV} value: {raw:?}"))
}

fn level_filter(level: Level) -> EnvFilter {
    EnvFilter::new(level.as_str().to_ascii_lowercase())
}

/// Parse a bare level name. Accepts `warning` as an alias for `warn`.
pub fn parse_level_str(s: &str) -> Option<Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

impl From<LogLevel> for Level {
    fn from(lvl: LogLevel) -> Self {
        match lvl {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

