//! Rate limit plugin.
//!
//! Declares a fixed-window quota for one API: at most `limit` requests per
//! `windowSeconds` window. The in-process enforcement lives in
//! [`crate::filters::RateLimitFilter`]; a distributed bucket backend stays
//! outside the gateway core.

use propylaea_core::{ApiPlugin, GatewayError, GatewayResult, PluginCodec};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

/// The registry kind of the rate limit plugin.
pub const RATE_LIMIT_KIND: &str = "rate.limit";

/// Per-definition fixed-window quota.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitPlugin {
    /// Maximum requests admitted per window.
    limit: u64,
    /// Window length in seconds.
    window_seconds: u64,
}

impl RateLimitPlugin {
    /// Creates a quota of `limit` requests per `window_seconds`.
    #[must_use]
    pub fn new(limit: u64, window_seconds: u64) -> Self {
        Self {
            limit,
            window_seconds,
        }
    }

    /// Returns the request quota per window.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.limit
    }

    /// Returns the window length.
    #[must_use]
    pub const fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }
}

impl ApiPlugin for RateLimitPlugin {
    fn kind(&self) -> &'static str {
        RATE_LIMIT_KIND
    }

    fn encode(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Codec for [`RateLimitPlugin`].
#[derive(Debug, Default)]
pub struct RateLimitCodec;

impl PluginCodec for RateLimitCodec {
    fn kind(&self) -> &'static str {
        RATE_LIMIT_KIND
    }

    fn decode(&self, doc: &Value) -> GatewayResult<Arc<dyn ApiPlugin>> {
        let plugin: RateLimitPlugin = serde_json::from_value(doc.clone())
            .map_err(|e| GatewayError::validation(format!("invalid rate.limit plugin: {e}")))?;
        if plugin.limit == 0 || plugin.window_seconds == 0 {
            return Err(GatewayError::validation(
                "rate.limit plugin needs a positive limit and windowSeconds",
            ));
        }
        Ok(Arc::new(plugin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_codec_round_trip() {
        let plugin = RateLimitPlugin::new(100, 60);
        let decoded = RateLimitCodec.decode(&plugin.encode()).unwrap();
        let concrete = decoded.as_any().downcast_ref::<RateLimitPlugin>().unwrap();
        assert_eq!(concrete, &plugin);
    }

    #[test]
    fn test_document_field_names() {
        let doc = RateLimitPlugin::new(5, 10).encode();
        assert_eq!(doc, json!({ "limit": 5, "windowSeconds": 10 }));
    }

    #[test]
    fn test_zero_quota_rejected() {
        let err = RateLimitCodec
            .decode(&json!({ "limit": 0, "windowSeconds": 60 }))
            .unwrap_err();
        assert_eq!(err.kind(), propylaea_core::ErrorKind::Validation);
    }

    #[test]
    fn test_missing_fields_rejected() {
        assert!(RateLimitCodec.decode(&json!({ "limit": 5 })).is_err());
    }
}
