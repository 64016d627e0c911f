//! The gateway configuration model.

use crate::error::ConfigError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-level gateway configuration.
///
/// Unknown fields are rejected: a typo in a section name must fail loading
/// rather than silently configure nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct GatewayConfig {
    /// Namespace this gateway instance serves. Appears in logs.
    pub namespace: String,

    /// Logging settings, handed to the telemetry initializer.
    pub logging: LoggingConfig,

    /// Enabled filters with their configuration documents, in chain
    /// registration order.
    pub filters: IndexMap<String, Value>,

    /// API definition documents published at startup.
    pub definitions: Vec<Value>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            namespace: "propylaea".to_string(),
            logging: LoggingConfig::default(),
            filters: IndexMap::new(),
            definitions: Vec::new(),
        }
    }
}

impl GatewayConfig {
    /// Validates the loaded configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.namespace.trim().is_empty() {
            return Err(ConfigError::validation_error("namespace must not be empty"));
        }
        self.logging.validate()
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LoggingConfig {
    /// Log level directive, e.g. `info` or `propylaea=debug,info`.
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.level.trim().is_empty() {
            return Err(ConfigError::validation_error(
                "logging.level must not be empty",
            ));
        }
        Ok(())
    }
}
