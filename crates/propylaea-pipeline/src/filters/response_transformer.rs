//! The response transformer filter.
//!
//! POST filter copying `resp.header:`-prefixed context variables into the
//! result headers. PRE filters (or the backend step) stage headers as
//! variables; this filter is the single place they become part of the wire
//! response. Variables whose name or value is not a valid header are
//! skipped with a warning rather than failing a response already produced.

use crate::filter::{Filter, FilterFactory, FilterPhase};
use http::header::{HeaderName, HeaderValue};
use propylaea_core::{ApiContext, GatewayResult, Task, RESPONSE_HEADER_PREFIX};
use serde_json::Value;
use std::sync::Arc;

/// Copies staged response headers onto the result.
#[derive(Debug, Default)]
pub struct ResponseTransformerFilter;

impl ResponseTransformerFilter {
    /// Creates the filter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Renders a variable value as header text. Strings drop their quotes.
fn header_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl Filter for ResponseTransformerFilter {
    fn name(&self) -> &'static str {
        "response_transformer"
    }

    fn phase(&self) -> FilterPhase {
        FilterPhase::Post
    }

    fn order(&self) -> i32 {
        100
    }

    fn should_apply(&self, ctx: &ApiContext) -> bool {
        ctx.result().is_some()
    }

    fn apply(&self, mut ctx: ApiContext) -> Task<ApiContext> {
        let staged: Vec<(String, String)> = ctx
            .variables()
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(RESPONSE_HEADER_PREFIX)
                    .map(|name| (name.to_string(), header_text(value)))
            })
            .collect();

        if let Some(result) = ctx.result() {
            let mut result = result.clone();
            for (name, value) in staged {
                match (
                    HeaderName::from_bytes(name.as_bytes()),
                    HeaderValue::from_str(&value),
                ) {
                    (Ok(name), Ok(value)) => {
                        result.headers_mut().insert(name, value);
                    }
                    _ => {
                        tracing::warn!(header = name, "staged response header is not valid");
                    }
                }
            }
            ctx.set_result(result);
        }

        Task::succeeded(ctx)
    }
}

/// Factory for [`ResponseTransformerFilter`].
#[derive(Debug, Default)]
pub struct ResponseTransformerFilterFactory;

impl FilterFactory for ResponseTransformerFilterFactory {
    fn name(&self) -> &'static str {
        "response_transformer"
    }

    fn create(&self, _config: &Value) -> GatewayResult<Arc<dyn Filter>> {
        Ok(Arc::new(ResponseTransformerFilter::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderMap, Method, StatusCode};
    use propylaea_core::ApiResult;
    use serde_json::json;

    fn ctx_with_result() -> ApiContext {
        let mut ctx = ApiContext::new(Method::GET, "/devices");
        let result = ApiResult::json_object(
            ctx.id(),
            StatusCode::OK,
            serde_json::Map::new(),
            HeaderMap::new(),
        );
        ctx.set_result(result);
        ctx
    }

    #[tokio::test]
    async fn test_staged_headers_land_on_result() {
        let mut ctx = ctx_with_result();
        ctx.set_variable("resp.header:x-api-version", json!("2"));
        ctx.set_variable("resp.header:x-cache", json!("miss"));
        ctx.set_variable("unrelated", json!("ignored"));

        let ctx = ResponseTransformerFilter::new().apply(ctx).await.unwrap();
        let headers = ctx.result().unwrap().headers();
        assert_eq!(headers.get("x-api-version").unwrap(), "2");
        assert_eq!(headers.get("x-cache").unwrap(), "miss");
        assert!(headers.get("unrelated").is_none());
    }

    #[tokio::test]
    async fn test_non_string_values_render_as_json() {
        let mut ctx = ctx_with_result();
        ctx.set_variable("resp.header:x-quota", json!(42));

        let ctx = ResponseTransformerFilter::new().apply(ctx).await.unwrap();
        assert_eq!(ctx.result().unwrap().headers().get("x-quota").unwrap(), "42");
    }

    #[tokio::test]
    async fn test_invalid_header_names_are_skipped() {
        let mut ctx = ctx_with_result();
        ctx.set_variable("resp.header:bad name", json!("x"));
        ctx.set_variable("resp.header:x-fine", json!("ok"));

        let ctx = ResponseTransformerFilter::new().apply(ctx).await.unwrap();
        let headers = ctx.result().unwrap().headers();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("x-fine").unwrap(), "ok");
    }

    #[test]
    fn test_requires_a_result() {
        let ctx = ApiContext::new(Method::GET, "/devices");
        assert!(!ResponseTransformerFilter::new().should_apply(&ctx));
    }
}
