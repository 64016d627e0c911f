//! The rate limit filter.
//!
//! Enforces the matched definition's `rate.limit` plugin with a fixed
//! window counted in process memory, keyed by API name. Exceeding the
//! quota fails the request with `RateLimited` (429) carrying the seconds
//! until the window resets; admitted requests record their remaining quota
//! in context variables.

use crate::filter::{Filter, FilterFactory, FilterPhase};
use crate::plugins::{RateLimitPlugin, RATE_LIMIT_KIND};
use parking_lot::Mutex;
use propylaea_core::{ApiContext, GatewayError, GatewayResult, Task};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Context variable holding the remaining quota after admission.
pub const REMAINING_VARIABLE: &str = "rate_limit.remaining";

/// One fixed window of request counting.
#[derive(Debug)]
struct Window {
    started_at: Instant,
    count: u64,
}

/// Enforces per-API fixed-window quotas.
#[derive(Debug, Default)]
pub struct RateLimitFilter {
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimitFilter {
    /// Creates the filter with empty counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one request against the API's window.
    ///
    /// Returns the remaining quota, or the time until the window resets
    /// when the quota is exhausted.
    fn admit(&self, api: &str, limit: u64, window: Duration) -> Result<u64, Duration> {
        let mut windows = self.windows.lock();
        let now = Instant::now();
        let entry = windows.entry(api.to_string()).or_insert(Window {
            started_at: now,
            count: 0,
        });

        let elapsed = now.duration_since(entry.started_at);
        if elapsed >= window {
            entry.started_at = now;
            entry.count = 0;
        }

        if entry.count >= limit {
            return Err(window.saturating_sub(now.duration_since(entry.started_at)));
        }
        entry.count += 1;
        Ok(limit - entry.count)
    }
}

impl Filter for RateLimitFilter {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    fn phase(&self) -> FilterPhase {
        FilterPhase::Pre
    }

    fn order(&self) -> i32 {
        200
    }

    fn should_apply(&self, ctx: &ApiContext) -> bool {
        ctx.api_definition()
            .is_some_and(|d| d.plugin(RATE_LIMIT_KIND).is_some())
    }

    fn apply(&self, mut ctx: ApiContext) -> Task<ApiContext> {
        let Some((name, plugin)) = ctx.api_definition().and_then(|d| {
            d.plugin_as::<RateLimitPlugin>(RATE_LIMIT_KIND)
                .map(|p| (d.name().to_string(), p.clone()))
        }) else {
            return Task::succeeded(ctx);
        };

        match self.admit(&name, plugin.limit(), plugin.window()) {
            Ok(remaining) => {
                ctx.set_variable(REMAINING_VARIABLE, json!(remaining));
                Task::succeeded(ctx)
            }
            Err(reset_in) => {
                let retry_after = reset_in.as_secs().max(1);
                tracing::debug!(
                    request_id = %ctx.id(),
                    api = name,
                    retry_after,
                    "quota exhausted"
                );
                Task::failed(GatewayError::rate_limited(
                    format!("quota of {} requests exhausted for '{name}'", plugin.limit()),
                    Some(retry_after),
                ))
            }
        }
    }
}

/// Factory for [`RateLimitFilter`]. Each chain gets its own counters.
#[derive(Debug, Default)]
pub struct RateLimitFilterFactory;

impl FilterFactory for RateLimitFilterFactory {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    fn create(&self, _config: &Value) -> GatewayResult<Arc<dyn Filter>> {
        Ok(Arc::new(RateLimitFilter::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Method, StatusCode};
    use propylaea_core::{ApiDefinition, ErrorKind, HttpEndpoint, PathPattern};

    fn limited_ctx(limit: u64) -> ApiContext {
        let definition = ApiDefinition::new(
            "limited",
            Method::GET,
            PathPattern::literal("/limited"),
            vec![HttpEndpoint::new("main", "svc", Method::GET, "/limited")],
        )
        .unwrap()
        .with_plugin(Arc::new(RateLimitPlugin::new(limit, 60)));

        let mut ctx = ApiContext::new(Method::GET, "/limited");
        ctx.set_api_definition(Arc::new(definition)).unwrap();
        ctx
    }

    #[tokio::test]
    async fn test_quota_admits_then_denies() {
        let filter = RateLimitFilter::new();

        let ctx = filter.apply(limited_ctx(2)).await.unwrap();
        assert_eq!(ctx.variable(REMAINING_VARIABLE), Some(&json!(1)));

        let ctx = filter.apply(limited_ctx(2)).await.unwrap();
        assert_eq!(ctx.variable(REMAINING_VARIABLE), Some(&json!(0)));

        let err = filter.apply(limited_ctx(2)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimited);
        assert_eq!(err.status_code(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_rejection_carries_retry_after() {
        let filter = RateLimitFilter::new();
        filter.apply(limited_ctx(1)).await.unwrap();

        let err = filter.apply(limited_ctx(1)).await.unwrap_err();
        let GatewayError::RateLimited {
            retry_after_seconds: Some(seconds),
            ..
        } = err
        else {
            panic!("expected a rate-limited error with retry-after");
        };
        assert!(seconds >= 1 && seconds <= 60);
    }

    #[test]
    fn test_windows_are_per_api() {
        let filter = RateLimitFilter::new();
        assert!(filter.admit("a", 1, Duration::from_secs(60)).is_ok());
        assert!(filter.admit("b", 1, Duration::from_secs(60)).is_ok());
        assert!(filter.admit("a", 1, Duration::from_secs(60)).is_err());
    }

    #[test]
    fn test_window_resets_after_elapse() {
        let filter = RateLimitFilter::new();
        let window = Duration::from_millis(0);
        // A zero-length window has always elapsed, so every request starts
        // a fresh window.
        assert!(filter.admit("a", 1, window).is_ok());
        assert!(filter.admit("a", 1, window).is_ok());
    }

    #[test]
    fn test_skips_unlimited_definitions() {
        let definition = ApiDefinition::new(
            "open",
            Method::GET,
            PathPattern::literal("/open"),
            vec![HttpEndpoint::new("main", "svc", Method::GET, "/open")],
        )
        .unwrap();
        let mut ctx = ApiContext::new(Method::GET, "/open");
        ctx.set_api_definition(Arc::new(definition)).unwrap();

        assert!(!RateLimitFilter::new().should_apply(&ctx));
    }
}
