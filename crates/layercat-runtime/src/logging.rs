#![forbid(unsafe_code)]

//! Global `tracing` subscriber setup.
//!
//! Library code only emits events; embedding applications call [`init`] once
//! at startup. The `LAYERCAT_LOG` environment variable, when set, replaces the
//! configured filter (same syntax as `RUST_LOG`).

use tracing_subscriber::filter::{EnvFilter, ParseError};
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;

use crate::config::LogConfig;

/// Environment variable that overrides [`LogConfig::level`].
pub const LOG_ENV_VAR: &str = "LAYERCAT_LOG";

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] ParseError),
    #[error("failed to install subscriber: {0}")]
    Install(#[from] TryInitError),
}

/// Install the global subscriber described by `config`.
///
/// # Errors
///
/// Fails if the filter does not parse or a global subscriber is already set.
pub fn init(config: &LogConfig) -> Result<(), LoggingError> {
    let filter = build_filter(&config.level, std::env::var(LOG_ENV_VAR).ok().as_deref())?;
    let json = config.json.then(|| fmt::layer().json());
    let text = (!config.json).then(fmt::layer);
    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(text)
        .try_init()?;
    tracing::debug!(message = "logging.init", level = %config.level, json = config.json);
    Ok(())
}

/// Filter from the configured level, or from `env_override` when present.
pub(crate) fn build_filter(level: &str, env_override: Option<&str>) -> Result<EnvFilter, ParseError> {
    match env_override.map(str::trim).filter(|s| !s.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives),
        None => EnvFilter::try_new(level.trim()),
    }
}
