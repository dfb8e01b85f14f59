//! Configuration file parsing and structures.
//!
//! lightbridge is configured with a single TOML file holding the logging setup,
//! the MQTT broker connection and the switch-to-light mappings.

use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::filter::Targets;

use crate::dispatch::LightMapping;
use crate::mqtt::MqttConfig;

/// Top-level configuration structure
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,

    pub mqtt: MqttConfig,

    /// Switch-to-light bindings, in file order
    #[serde(default)]
    pub mappings: Vec<LightMapping>,
}

#[derive(Debug, Default, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default)]
    pub level: LogLevel,

    /// Per-target levels, e.g. `rumqttc = "warn"`
    #[serde(default)]
    pub overrides: HashMap<String, LogLevel>,
}

impl LoggingConfig {
    /// Build a tracing filter from the default level and the per-target overrides
    pub fn targets(&self) -> Targets {
        self.overrides
            .iter()
            .fold(Targets::new().with_default(self.level), |targets, (target, level)| {
                targets.with_target(target.clone(), *level)
            })
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(path.as_ref().to_path_buf(), e))?;

        Self::parse(&contents)
    }

    /// Parse configuration from TOML text
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(ConfigError::Parse)
    }

    /// Validate the configuration, returning every problem found
    ///
    /// Duplicate switch ids are not reported here; the mapping table resolves
    /// them when it is built.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.mqtt.broker.is_empty() {
            errors.push("mqtt.broker must not be empty".to_string());
        }

        for (i, mapping) in self.mappings.iter().enumerate() {
            if mapping.switch_id.is_empty() {
                errors.push(format!("mappings[{}].switch_id must not be empty", i));
            } else if mapping.switch_id.contains('/') {
                errors.push(format!(
                    "mappings[{}].switch_id '{}' contains '/' and can never match an action topic",
                    i, mapping.switch_id
                ));
            }

            if mapping.light_id.is_empty() {
                errors.push(format!("mappings[{}].light_id must not be empty", i));
            } else if mapping.light_id.contains('/') {
                errors.push(format!(
                    "mappings[{}].light_id '{}' must not contain '/'",
                    i, mapping.light_id
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
}
