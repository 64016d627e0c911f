//! The route-matching filter.
//!
//! Runs ahead of every other PRE filter and resolves the request to exactly
//! one published definition through the registry's current snapshot. Later
//! filters read the definition off the context; a request nothing matched
//! never reaches them.

use crate::filter::{Filter, FilterFactory, FilterPhase};
use propylaea_core::{ApiContext, GatewayResult, Task};
use propylaea_router::ApiRegistry;
use serde_json::Value;
use std::sync::Arc;

/// Resolves the request route and pins it on the context.
#[derive(Debug)]
pub struct ApiMatchFilter {
    registry: Arc<ApiRegistry>,
}

impl ApiMatchFilter {
    /// Creates the filter over a shared registry.
    #[must_use]
    pub fn new(registry: Arc<ApiRegistry>) -> Self {
        Self { registry }
    }
}

impl Filter for ApiMatchFilter {
    fn name(&self) -> &'static str {
        "api_match"
    }

    fn phase(&self) -> FilterPhase {
        FilterPhase::Pre
    }

    fn order(&self) -> i32 {
        0
    }

    fn apply(&self, mut ctx: ApiContext) -> Task<ApiContext> {
        let outcome = self
            .registry
            .match_route(ctx.method(), ctx.path())
            .and_then(|definition| {
                tracing::debug!(
                    request_id = %ctx.id(),
                    api = definition.name(),
                    "route matched"
                );
                ctx.set_api_definition(definition)?;
                Ok(ctx)
            });
        Task::from_result(outcome)
    }
}

/// Factory for [`ApiMatchFilter`], sharing one registry across chains.
#[derive(Debug)]
pub struct ApiMatchFilterFactory {
    registry: Arc<ApiRegistry>,
}

impl ApiMatchFilterFactory {
    /// Creates the factory over a shared registry.
    #[must_use]
    pub fn new(registry: Arc<ApiRegistry>) -> Self {
        Self { registry }
    }
}

impl FilterFactory for ApiMatchFilterFactory {
    fn name(&self) -> &'static str {
        "api_match"
    }

    fn create(&self, _config: &Value) -> GatewayResult<Arc<dyn Filter>> {
        Ok(Arc::new(ApiMatchFilter::new(Arc::clone(&self.registry))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use propylaea_core::{ApiDefinition, ErrorKind, HttpEndpoint, PathPattern};

    fn registry() -> Arc<ApiRegistry> {
        let registry = ApiRegistry::new();
        registry
            .publish(
                ApiDefinition::new(
                    "get_user",
                    Method::GET,
                    PathPattern::regex("/user/\\d+").unwrap(),
                    vec![HttpEndpoint::new("main", "user", Method::GET, "/users")],
                )
                .unwrap(),
            )
            .unwrap();
        Arc::new(registry)
    }

    #[tokio::test]
    async fn test_match_pins_definition() {
        let filter = ApiMatchFilter::new(registry());
        let ctx = filter
            .apply(ApiContext::new(Method::GET, "/user/42"))
            .await
            .unwrap();
        assert_eq!(ctx.api_definition().unwrap().name(), "get_user");
    }

    #[tokio::test]
    async fn test_no_match_fails_not_found() {
        let filter = ApiMatchFilter::new(registry());
        let err = filter
            .apply(ApiContext::new(Method::GET, "/nothing"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_runs_before_everything_else() {
        let filter = ApiMatchFilter::new(registry());
        assert_eq!(filter.order(), 0);
        assert_eq!(filter.phase(), FilterPhase::Pre);
    }
}
