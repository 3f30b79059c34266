//! Configuration loading and typed config structures for the viewer client.
//!
//! Configuration is a small YAML document. Every field has a default that
//! matches the reference engine setup, so an empty file (or no file) is valid:
//!
//! ```yaml
//! transport:
//!   endpoint: "ws://127.0.0.1:9001"
//!   wire_format: delta
//! render:
//!   spacing: { x: 2.0, y: 2.0, z: 2.0 }
//!   grid_range: 25
//! logging:
//!   level: info
//!   json: false
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::codec::WireFormat;
use crate::mapper::Spacing;

/// Environment variable that overrides `transport.endpoint`.
pub const ENDPOINT_ENV: &str = "GRIDSYNC_ENDPOINT";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is not usable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level client configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ClientConfig {
    /// Engine connection settings.
    #[serde(default)]
    pub transport: TransportConfig,

    /// Render-space mapping settings.
    #[serde(default)]
    pub render: RenderConfig,

    /// Logging settings for the viewer binary.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ClientConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `GRIDSYNC_ENDPOINT` overrides `transport.endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.transport.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Check values that parse but cannot be used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a non-`ws://`/`wss://` endpoint
    /// or a spacing factor that is not finite and positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = self.transport.endpoint.as_str();
        if !(endpoint.starts_with("ws://") || endpoint.starts_with("wss://")) {
            return Err(ConfigError::Invalid(format!(
                "transport.endpoint must be a ws:// or wss:// URL, got {endpoint:?}"
            )));
        }
        self.render
            .spacing
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("render.spacing: {e}")))
    }
}

/// Engine connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransportConfig {
    /// `WebSocket` URL of the simulation engine.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Shape of inbound messages.
    #[serde(default)]
    pub wire_format: WireFormat,
}

impl TransportConfig {
    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(ENDPOINT_ENV) {
            self.endpoint = val;
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            wire_format: WireFormat::default(),
        }
    }
}

/// Render-space mapping settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RenderConfig {
    /// Per-axis spacing between adjacent cells.
    #[serde(default)]
    pub spacing: Spacing,

    /// Half-extent of the engine lattice, used for the reference grid.
    #[serde(default = "default_grid_range")]
    pub grid_range: u16,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            spacing: Spacing::default(),
            grid_range: default_grid_range(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_endpoint() -> String {
    "ws://127.0.0.1:9001".to_owned()
}

const fn default_grid_range() -> u16 {
    25
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn default_config_targets_local_engine() {
        let config = ClientConfig::default();
        assert_eq!(config.transport.endpoint, "ws://127.0.0.1:9001");
        assert_eq!(config.transport.wire_format, WireFormat::Delta);
        assert_eq!(config.render.spacing, Spacing::uniform(2.0));
        assert_eq!(config.render.grid_range, 25);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
transport:
  endpoint: "ws://engine.local:9100"
  wire_format: dense_grid
render:
  spacing:
    x: 1.5
    y: 1.0
    z: 0.5
  grid_range: 10
logging:
  level: debug
  json: true
"#;
        let config = ClientConfig::parse(yaml);
        assert!(config.is_ok(), "parse failed: {config:?}");
        let config = config.unwrap_or_default();
        if std::env::var(ENDPOINT_ENV).is_err() {
            assert_eq!(config.transport.endpoint, "ws://engine.local:9100");
        }
        assert_eq!(config.transport.wire_format, WireFormat::DenseGrid);
        assert_eq!(config.render.spacing.x, 1.5);
        assert_eq!(config.render.spacing.z, 0.5);
        assert_eq!(config.render.grid_range, 10);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    fn parse_partial_spacing_keeps_defaults() {
        let config = ClientConfig::parse("render:\n  spacing:\n    y: 4.0\n").unwrap_or_default();
        assert_eq!(config.render.spacing.x, 2.0);
        assert_eq!(config.render.spacing.y, 4.0);
    }

    #[test]
    fn parse_empty_yaml() {
        assert!(ClientConfig::parse("").is_ok());
    }

    #[test]
    fn rejects_non_websocket_endpoint() {
        let mut config = ClientConfig::default();
        config.transport.endpoint = "http://127.0.0.1:9001".to_owned();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_zero_spacing() {
        let result = ClientConfig::parse("render:\n  spacing:\n    x: 0.0\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_spacing_that_overflows_render_space() {
        let result = ClientConfig::parse("render:\n  spacing:\n    x: 1.0e308\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_unknown_wire_format() {
        let result = ClientConfig::parse("transport:\n  wire_format: protobuf\n");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }
}
