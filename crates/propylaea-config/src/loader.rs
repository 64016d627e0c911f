//! Layered configuration loading.
//!
//! Later layers override earlier ones: built-in defaults, then the
//! configuration file, then environment variables. A `.env` file is read
//! before environment overrides are applied, so development setups work
//! without exporting anything.

use crate::config::GatewayConfig;
use crate::error::ConfigError;
use std::env;
use std::fs;
use std::path::Path;

/// Layered loader for [`GatewayConfig`].
///
/// # Example
///
/// ```no_run
/// use propylaea_config::ConfigLoader;
///
/// # fn main() -> Result<(), propylaea_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_optional_file("gateway.toml")?
///     .with_env_prefix("PROPYLAEA")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: GatewayConfig,
    env_prefix: Option<String>,
}

impl ConfigLoader {
    /// Creates a loader starting from the built-in defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a configuration file. TOML or JSON by file extension.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let format = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => "json",
            _ => "toml",
        };
        self.config = parse(&content, format)?;
        Ok(self)
    }

    /// Loads a configuration file if it exists, otherwise keeps the
    /// current layer untouched.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Loads configuration from a string in the given format (`toml` or
    /// `json`).
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = parse(content, format)?;
        Ok(self)
    }

    /// Enables environment overrides under `PREFIX__SECTION__KEY`, e.g.
    /// `PROPYLAEA__LOGGING__LEVEL=debug`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Applies the environment layer, validates, and returns the config.
    pub fn load(self) -> Result<GatewayConfig, ConfigError> {
        let mut config = self.config;

        if let Some(prefix) = &self.env_prefix {
            let _ = dotenvy::dotenv();

            if let Ok(value) = env::var(format!("{prefix}__NAMESPACE")) {
                config.namespace = value;
            }
            if let Ok(value) = env::var(format!("{prefix}__LOGGING__LEVEL")) {
                config.logging.level = value;
            }
            let json_var = format!("{prefix}__LOGGING__JSON");
            if let Ok(value) = env::var(&json_var) {
                config.logging.json = value.parse().map_err(|_| {
                    ConfigError::env_parse_error(&json_var, "expected true or false")
                })?;
            }
        }

        config.validate()?;
        tracing::debug!(namespace = config.namespace, "configuration loaded");
        Ok(config)
    }
}

fn parse(content: &str, format: &str) -> Result<GatewayConfig, ConfigError> {
    match format.to_lowercase().as_str() {
        "toml" => Ok(toml::from_str(content)?),
        "json" => Ok(serde_json::from_str(content)?),
        other => Err(ConfigError::validation_error(format!(
            "unsupported configuration format: {other}"
        ))),
    }
}
