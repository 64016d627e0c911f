//! Telemetry error types.

use thiserror::Error;

/// Result type alias using [`TelemetryError`].
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Errors that can occur while initializing telemetry.
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Failed to initialize the logging subsystem.
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_init_display() {
        let err = TelemetryError::LoggingInit("invalid directive".to_string());
        assert!(err.to_string().contains("invalid directive"));
    }
}
