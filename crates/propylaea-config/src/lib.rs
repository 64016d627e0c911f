//! # Propylaea Config
//!
//! Typed configuration loading for the Propylaea gateway:
//!
//! - TOML and JSON configuration files
//! - Environment variable overrides (`PREFIX__SECTION__KEY`)
//! - Layered loading (defaults, then file, then environment)
//! - Strict parsing: unknown fields fail loading
//!
//! # Configuration file format
//!
//! ```toml
//! namespace = "iot"
//!
//! [logging]
//! level = "info"
//! json = true
//!
//! [filters.api_match]
//! [filters.rate_limit]
//!
//! [[definitions]]
//! name = "list_devices"
//! method = "GET"
//! path = "/devices"
//! ```

#![doc(html_root_url = "https://docs.rs/propylaea-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;

pub use config::{GatewayConfig, LoggingConfig};
pub use error::ConfigError;
pub use loader::ConfigLoader;
