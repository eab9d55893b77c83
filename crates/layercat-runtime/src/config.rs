#![forbid(unsafe_code)]

//! Editor configuration, loadable from TOML or JSON.
//!
//! ```toml
//! # layercat.toml
//! [drag]
//! auto_expand_delay_ms = 600
//! header_drop = "keep_position"
//!
//! [history]
//! max_depth = 100
//!
//! [logging]
//! level = "info"
//! json = false
//! ```
//!
//! ```rust,ignore
//! let config = EditorConfig::load_toml_file("layercat.toml")?;
//! ```
//!
//! Every section and field is optional; missing values take the defaults
//! shown above.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration of a [`CatalogEditor`](crate::CatalogEditor) and
/// its drag controller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub drag: DragConfig,
    pub history: HistoryConfig,
    pub logging: LogConfig,
}

/// Drag-and-drop behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// Dwell time over a collapsed target before it auto-expands.
    pub auto_expand_delay_ms: u64,
    /// What a drop on a partition header does.
    pub header_drop: HeaderDropPolicy,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            auto_expand_delay_ms: 600,
            header_drop: HeaderDropPolicy::KeepPosition,
        }
    }
}

impl DragConfig {
    #[must_use]
    pub fn auto_expand_delay(&self) -> Duration {
        Duration::from_millis(self.auto_expand_delay_ms)
    }
}

/// Placement of a layer dropped on a partition header or empty body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderDropPolicy {
    /// Change membership only; the layer keeps its physical ordinal.
    #[default]
    KeepPosition,
    /// Change membership and move the layer after the partition's last member.
    AppendToEnd,
}

/// Undo history bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Snapshots retained, including the current state.
    pub max_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_depth: 100 }
    }
}

/// Subscriber settings consumed by [`crate::logging::init`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter directive, e.g. `info` or `layercat_core=debug`.
    pub level: String,
    /// Emit JSON lines instead of human-readable text.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            json: false,
        }
    }
}

impl EditorConfig {
    /// Parse a TOML string without validating.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Parse a TOML file without validating.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Parse a JSON string without validating.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Parse a JSON file without validating.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Parse and validate a TOML file.
    pub fn load_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)?.validated()
    }

    /// Parse and validate a JSON file.
    pub fn load_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json_file(path)?.validated()
    }

    /// Check every parameter. An empty list means the config is usable.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.drag.auto_expand_delay_ms == 0 {
            errors.push("drag.auto_expand_delay_ms must be > 0".to_owned());
        }
        if self.drag.auto_expand_delay_ms > 10_000 {
            errors.push(format!(
                "drag.auto_expand_delay_ms must be <= 10000, got {}",
                self.drag.auto_expand_delay_ms
            ));
        }
        if self.history.max_depth == 0 {
            errors.push("history.max_depth must be > 0".to_owned());
        }
        if self.logging.level.trim().is_empty() {
            errors.push("logging.level must not be empty".to_owned());
        }
        errors
    }

    fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Errors that can occur when loading an [`EditorConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[source] std::io::Error),
    #[error("config TOML parse error: {0}")]
    Toml(#[source] toml::de::Error),
    #[error("config JSON parse error: {0}")]
    Json(#[source] serde_json::Error),
    #[error("invalid config: {}", .0.join("; "))]
    Validation(Vec<String>),
}
