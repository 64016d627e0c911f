//! Error types for Propylaea.
//!
//! This module provides [`GatewayError`], the standard error type used
//! throughout the gateway. Every filter and the route matcher signal failures
//! through this type, carried on the [`Task`](crate::task::Task) failure
//! channel; the dispatch handler is the single place that maps an error to a
//! wire response.
//!
//! Each error kind carries a stable numeric wire code and maps to an HTTP
//! status code. The wire envelope is the two-field document
//! `{ "code": <numeric>, "message": <string> }`.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`GatewayError`].
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Kinds of gateway errors, used for classification and status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Request or definition validation errors.
    Validation,
    /// Malformed JSON encountered while constructing a result.
    InvalidJson,
    /// Authentication failed: the presented token is invalid.
    InvalidToken,
    /// Authentication failed: the presented token has expired.
    ExpiredToken,
    /// Authorization or restriction-plugin denial.
    PermissionDenied,
    /// No route matched the request.
    NotFound,
    /// Ambiguous route match or duplicate definition.
    Conflict,
    /// A rate-limit policy rejected the request.
    RateLimited,
    /// A backend or service-discovery dependency failed.
    UnknownRemote,
    /// A backend or service-discovery dependency timed out.
    RemoteTimeout,
    /// An internal invariant was violated. Always fatal to the request.
    IllegalState,
    /// Any other internal error.
    Internal,
}

impl ErrorKind {
    /// Returns the HTTP status code for this error kind.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation | Self::InvalidJson => StatusCode::BAD_REQUEST,
            Self::InvalidToken | Self::ExpiredToken => StatusCode::UNAUTHORIZED,
            Self::PermissionDenied => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::UnknownRemote => StatusCode::BAD_GATEWAY,
            Self::RemoteTimeout => StatusCode::GATEWAY_TIMEOUT,
            Self::IllegalState | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the stable numeric wire code for this error kind.
    #[must_use]
    pub const fn wire_code(&self) -> u32 {
        match self {
            Self::Validation => 1000,
            Self::InvalidJson => 1001,
            Self::InvalidToken => 1002,
            Self::ExpiredToken => 1003,
            Self::PermissionDenied => 1004,
            Self::NotFound => 1005,
            Self::Conflict => 1006,
            Self::RateLimited => 1007,
            Self::UnknownRemote => 1010,
            Self::RemoteTimeout => 1011,
            Self::IllegalState => 1500,
            Self::Internal => 1999,
        }
    }
}

/// Standard error type for the gateway.
///
/// `GatewayError` provides structured errors with:
/// - Error kind classification ([`ErrorKind`])
/// - HTTP status code mapping
/// - A serializable `{code, message}` envelope for responses
/// - Error chaining support for internal errors
///
/// # Example
///
/// ```
/// use propylaea_core::{ErrorKind, GatewayError};
///
/// let err = GatewayError::not_found("no API matched GET /missing");
/// assert_eq!(err.kind(), ErrorKind::NotFound);
/// assert_eq!(err.status_code(), http::StatusCode::NOT_FOUND);
/// ```
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Validation of a request or definition failed.
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable error message.
        message: String,
    },

    /// Malformed JSON in a backend payload.
    #[error("Invalid JSON: {message}")]
    InvalidJson {
        /// Human-readable error message.
        message: String,
    },

    /// The presented authentication token is invalid.
    #[error("Invalid token: {message}")]
    InvalidToken {
        /// Human-readable error message.
        message: String,
    },

    /// The presented authentication token has expired.
    #[error("Expired token: {message}")]
    ExpiredToken {
        /// Human-readable error message.
        message: String,
    },

    /// Authorization denied.
    #[error("Permission denied: {message}")]
    PermissionDenied {
        /// Human-readable error message.
        message: String,
    },

    /// No route matched.
    #[error("Not found: {message}")]
    NotFound {
        /// Human-readable error message.
        message: String,
    },

    /// Ambiguous routing or duplicate definition. A configuration defect.
    #[error("Conflict: {message}")]
    Conflict {
        /// Human-readable error message.
        message: String,
    },

    /// A rate-limit policy rejected the request.
    #[error("Rate limited: {message}")]
    RateLimited {
        /// Human-readable error message.
        message: String,
        /// Seconds until the limit window resets.
        retry_after_seconds: Option<u64>,
    },

    /// A backend or service-discovery dependency failed.
    #[error("Unknown remote: {message}")]
    UnknownRemote {
        /// Human-readable error message.
        message: String,
        /// The name of the failing service, when known.
        service: Option<String>,
    },

    /// A backend or service-discovery dependency timed out.
    #[error("Remote timeout: {message}")]
    RemoteTimeout {
        /// Human-readable error message.
        message: String,
    },

    /// An internal invariant was violated (e.g. double-resolution of a task).
    #[error("Illegal state: {message}")]
    IllegalState {
        /// Human-readable error message.
        message: String,
    },

    /// Any other internal error.
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// The underlying error. Not exposed to clients.
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl GatewayError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates an invalid-JSON error.
    #[must_use]
    pub fn invalid_json(message: impl Into<String>) -> Self {
        Self::InvalidJson {
            message: message.into(),
        }
    }

    /// Creates an invalid-token error.
    #[must_use]
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken {
            message: message.into(),
        }
    }

    /// Creates an expired-token error.
    #[must_use]
    pub fn expired_token(message: impl Into<String>) -> Self {
        Self::ExpiredToken {
            message: message.into(),
        }
    }

    /// Creates a permission-denied error.
    #[must_use]
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates a conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates a rate-limited error.
    #[must_use]
    pub fn rate_limited(message: impl Into<String>, retry_after_seconds: Option<u64>) -> Self {
        Self::RateLimited {
            message: message.into(),
            retry_after_seconds,
        }
    }

    /// Creates an unknown-remote error.
    #[must_use]
    pub fn unknown_remote(message: impl Into<String>, service: Option<impl Into<String>>) -> Self {
        Self::UnknownRemote {
            message: message.into(),
            service: service.map(Into::into),
        }
    }

    /// Creates a remote-timeout error.
    #[must_use]
    pub fn remote_timeout(message: impl Into<String>) -> Self {
        Self::RemoteTimeout {
            message: message.into(),
        }
    }

    /// Creates an illegal-state error.
    #[must_use]
    pub fn illegal_state(message: impl Into<String>) -> Self {
        Self::IllegalState {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::InvalidJson { .. } => ErrorKind::InvalidJson,
            Self::InvalidToken { .. } => ErrorKind::InvalidToken,
            Self::ExpiredToken { .. } => ErrorKind::ExpiredToken,
            Self::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::UnknownRemote { .. } => ErrorKind::UnknownRemote,
            Self::RemoteTimeout { .. } => ErrorKind::RemoteTimeout,
            Self::IllegalState { .. } => ErrorKind::IllegalState,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.kind().status_code()
    }

    /// Returns the stable numeric wire code for this error.
    #[must_use]
    pub const fn wire_code(&self) -> u32 {
        self.kind().wire_code()
    }

    /// Converts this error to the wire envelope.
    #[must_use]
    pub fn to_envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            code: self.wire_code(),
            message: self.to_string(),
        }
    }
}

/// Serializable `{code, message}` error envelope for HTTP responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Stable numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
}
