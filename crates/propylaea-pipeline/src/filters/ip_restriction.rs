//! The IP restriction filter.
//!
//! Applies only to requests whose matched definition carries an
//! `ip.restriction` plugin. The caller address is taken from the first
//! entry of the `x-forwarded-for` header; a restricted API with no caller
//! address is denied outright.

use crate::filter::{Filter, FilterFactory, FilterPhase};
use crate::plugins::{IpRestrictionPlugin, IP_RESTRICTION_KIND};
use propylaea_core::{ApiContext, GatewayError, GatewayResult, Task};
use serde_json::Value;
use std::sync::Arc;

/// Enforces the matched definition's IP admission rules.
#[derive(Debug, Default)]
pub struct IpRestrictionFilter;

impl IpRestrictionFilter {
    /// Creates the filter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Extracts the caller address from the forwarding header.
fn caller_ip(ctx: &ApiContext) -> Option<String> {
    let forwarded = ctx.headers().get("x-forwarded-for")?.to_str().ok()?;
    let first = forwarded.split(',').next()?.trim();
    (!first.is_empty()).then(|| first.to_string())
}

impl Filter for IpRestrictionFilter {
    fn name(&self) -> &'static str {
        "ip_restriction"
    }

    fn phase(&self) -> FilterPhase {
        FilterPhase::Pre
    }

    fn order(&self) -> i32 {
        100
    }

    fn should_apply(&self, ctx: &ApiContext) -> bool {
        ctx.api_definition()
            .is_some_and(|d| d.plugin(IP_RESTRICTION_KIND).is_some())
    }

    fn apply(&self, ctx: ApiContext) -> Task<ApiContext> {
        let Some(plugin) = ctx
            .api_definition()
            .and_then(|d| d.plugin_as::<IpRestrictionPlugin>(IP_RESTRICTION_KIND))
        else {
            return Task::succeeded(ctx);
        };

        let Some(ip) = caller_ip(&ctx) else {
            return Task::failed(GatewayError::permission_denied(
                "caller address unknown for a restricted API",
            ));
        };

        if plugin.permits(&ip) {
            Task::succeeded(ctx)
        } else {
            tracing::debug!(request_id = %ctx.id(), ip, "caller address denied");
            Task::failed(GatewayError::permission_denied(format!(
                "caller address {ip} is not admitted"
            )))
        }
    }
}

/// Factory for [`IpRestrictionFilter`].
#[derive(Debug, Default)]
pub struct IpRestrictionFilterFactory;

impl FilterFactory for IpRestrictionFilterFactory {
    fn name(&self) -> &'static str {
        "ip_restriction"
    }

    fn create(&self, _config: &Value) -> GatewayResult<Arc<dyn Filter>> {
        Ok(Arc::new(IpRestrictionFilter::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderMap, HeaderValue, Method};
    use indexmap::IndexMap;
    use propylaea_core::{ApiDefinition, ErrorKind, HttpEndpoint, PathPattern};

    fn restricted_ctx(forwarded_for: Option<&str>) -> ApiContext {
        let definition = ApiDefinition::new(
            "restricted",
            Method::GET,
            PathPattern::literal("/secure"),
            vec![HttpEndpoint::new("main", "svc", Method::GET, "/secure")],
        )
        .unwrap()
        .with_plugin(Arc::new(IpRestrictionPlugin::new(
            vec!["10.4.7.*".to_string()],
            vec!["10.4.*.*".to_string()],
        )));

        let mut headers = HeaderMap::new();
        if let Some(value) = forwarded_for {
            headers.insert("x-forwarded-for", HeaderValue::from_str(value).unwrap());
        }
        let mut ctx =
            ApiContext::with_request(Method::GET, "/secure", headers, IndexMap::new(), None);
        ctx.set_api_definition(Arc::new(definition)).unwrap();
        ctx
    }

    #[tokio::test]
    async fn test_whitelisted_caller_is_admitted() {
        let ctx = IpRestrictionFilter::new()
            .apply(restricted_ctx(Some("10.4.7.15")))
            .await
            .unwrap();
        assert_eq!(ctx.path(), "/secure");
    }

    #[tokio::test]
    async fn test_blacklisted_caller_is_denied() {
        let err = IpRestrictionFilter::new()
            .apply(restricted_ctx(Some("10.4.8.15")))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }

    #[tokio::test]
    async fn test_first_forwarded_entry_is_used() {
        // The proxy chain appends; the caller is the first entry.
        let err = IpRestrictionFilter::new()
            .apply(restricted_ctx(Some("10.4.8.15, 10.4.7.1")))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }

    #[tokio::test]
    async fn test_unknown_caller_is_denied() {
        let err = IpRestrictionFilter::new()
            .apply(restricted_ctx(None))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_skips_unrestricted_definitions() {
        let definition = ApiDefinition::new(
            "open",
            Method::GET,
            PathPattern::literal("/open"),
            vec![HttpEndpoint::new("main", "svc", Method::GET, "/open")],
        )
        .unwrap();
        let mut ctx = ApiContext::new(Method::GET, "/open");
        ctx.set_api_definition(Arc::new(definition)).unwrap();

        assert!(!IpRestrictionFilter::new().should_apply(&ctx));
    }
}
