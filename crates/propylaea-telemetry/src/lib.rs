//! # Propylaea Telemetry
//!
//! Structured logging initialization for the Propylaea gateway, built on
//! the `tracing` ecosystem:
//!
//! - [`LogConfig`] - Level directive, JSON toggle, span events
//! - [`init_logging`] - One-shot subscriber installation

#![doc(html_root_url = "https://docs.rs/propylaea-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{init_logging, LogConfig};
