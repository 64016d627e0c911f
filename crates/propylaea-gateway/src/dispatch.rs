//! The dispatch handler.
//!
//! One request, one flow: build the [`ApiContext`], run the PRE chain,
//! invoke the backend, run the POST chain, write the result. Any failure
//! along the way short-circuits straight to the error path, which maps the
//! error through the `{code, message}` envelope exactly once. Elapsed time
//! and the resolved API name are logged for every outcome.

use crate::request::{InboundRequest, OutboundResponse};
use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE, RETRY_AFTER};
use http::HeaderMap;
use propylaea_core::{ApiContext, ApiResult, GatewayError, RequestId, Task};
use propylaea_pipeline::FilterChain;
use std::sync::Arc;
use std::time::Instant;

/// Response header carrying the request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Invokes the matched definition's backend endpoints.
///
/// Runs between the PRE and POST chains and must set the context result.
/// The HTTP client behind it is an external collaborator; tests and
/// embedders provide their own.
pub trait BackendInvoker: Send + Sync + 'static {
    /// Invokes the backend for the given context.
    fn invoke(&self, ctx: ApiContext) -> Task<ApiContext>;
}

/// Orchestrates the request lifecycle.
pub struct DispatchHandler {
    chain: Arc<FilterChain>,
    invoker: Arc<dyn BackendInvoker>,
}

impl DispatchHandler {
    /// Creates a handler over a shared chain and backend invoker.
    #[must_use]
    pub fn new(chain: Arc<FilterChain>, invoker: Arc<dyn BackendInvoker>) -> Self {
        Self { chain, invoker }
    }

    /// Dispatches one request to one response.
    ///
    /// Never fails: every error becomes an envelope response.
    pub async fn dispatch(&self, request: InboundRequest) -> OutboundResponse {
        let started = Instant::now();
        let (method, path, headers, params, body) = request.into_parts();
        let log_method = method.clone();
        let log_path = path.clone();

        let ctx = ApiContext::with_request(method, path, headers, params, body);
        let request_id = ctx.id();

        match self.process(ctx).await {
            Ok((api, result)) => {
                let response = write_result(request_id, &result);
                tracing::info!(
                    request_id = %request_id,
                    method = %log_method,
                    path = log_path,
                    api,
                    status = response.status().as_u16(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "request completed"
                );
                response
            }
            Err((api, error)) => {
                let response = write_error(request_id, &error);
                tracing::warn!(
                    request_id = %request_id,
                    method = %log_method,
                    path = log_path,
                    api,
                    status = response.status().as_u16(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    %error,
                    "request failed"
                );
                response
            }
        }
    }

    /// Runs the chains and the backend, pairing outcomes with the API name
    /// once it is known.
    async fn process(
        &self,
        ctx: ApiContext,
    ) -> Result<(Option<String>, ApiResult), (Option<String>, GatewayError)> {
        let ctx = self.chain.run_pre(ctx).await.map_err(|e| (None, e))?;
        let api = ctx.api_definition().map(|d| d.name().to_string());

        let ctx = self
            .invoker
            .invoke(ctx)
            .await
            .map_err(|e| (api.clone(), e))?;
        let mut ctx = self
            .chain
            .run_post(ctx)
            .await
            .map_err(|e| (api.clone(), e))?;

        let result = ctx.take_result().map_err(|e| (api.clone(), e))?;
        Ok((api, result))
    }
}

impl std::fmt::Debug for DispatchHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchHandler")
            .field("chain", &self.chain)
            .finish_non_exhaustive()
    }
}

fn write_result(request_id: RequestId, result: &ApiResult) -> OutboundResponse {
    let mut headers = result.headers().clone();
    finalize_headers(&mut headers, request_id);
    OutboundResponse::new(
        result.status_code(),
        headers,
        Bytes::from(result.encode()),
    )
}

fn write_error(request_id: RequestId, error: &GatewayError) -> OutboundResponse {
    let envelope = error.to_envelope();
    let body = serde_json::to_vec(&envelope).unwrap_or_else(|_| b"{}".to_vec());

    let mut headers = HeaderMap::new();
    if let GatewayError::RateLimited {
        retry_after_seconds: Some(seconds),
        ..
    } = error
    {
        if let Ok(value) = HeaderValue::from_str(&seconds.to_string()) {
            headers.insert(RETRY_AFTER, value);
        }
    }
    finalize_headers(&mut headers, request_id);
    OutboundResponse::new(error.status_code(), headers, Bytes::from(body))
}

fn finalize_headers(headers: &mut HeaderMap, request_id: RequestId) {
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        headers.insert(REQUEST_ID_HEADER, value);
    }
    headers
        .entry(CONTENT_TYPE)
        .or_insert_with(|| HeaderValue::from_static("application/json"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Method, StatusCode};
    use propylaea_core::{ApiDefinition, HttpEndpoint, PathPattern};
    use propylaea_pipeline::filters::{ApiMatchFilter, ResponseTransformerFilter};
    use propylaea_router::ApiRegistry;
    use serde_json::{json, Value};

    /// Invoker returning a canned object body.
    struct StubInvoker {
        payload: &'static str,
        stage_header: bool,
    }

    impl BackendInvoker for StubInvoker {
        fn invoke(&self, mut ctx: ApiContext) -> Task<ApiContext> {
            if self.stage_header {
                ctx.set_variable("resp.header:x-api-version", json!("2"));
            }
            let outcome = ApiResult::from_payload(
                ctx.id(),
                StatusCode::OK,
                self.payload,
                HeaderMap::new(),
            )
            .map(|result| {
                ctx.set_result(result);
                ctx
            });
            Task::from_result(outcome)
        }
    }

    /// Invoker that never sets a result.
    struct ForgetfulInvoker;

    impl BackendInvoker for ForgetfulInvoker {
        fn invoke(&self, ctx: ApiContext) -> Task<ApiContext> {
            Task::succeeded(ctx)
        }
    }

    fn registry() -> Arc<ApiRegistry> {
        let registry = ApiRegistry::new();
        registry
            .publish(
                ApiDefinition::new(
                    "list_devices",
                    Method::GET,
                    PathPattern::literal("/devices"),
                    vec![HttpEndpoint::new("main", "device", Method::GET, "/devices")],
                )
                .unwrap(),
            )
            .unwrap();
        Arc::new(registry)
    }

    fn handler(invoker: Arc<dyn BackendInvoker>) -> DispatchHandler {
        let chain = FilterChain::builder()
            .filter(Arc::new(ApiMatchFilter::new(registry())))
            .filter(Arc::new(ResponseTransformerFilter::new()))
            .build();
        DispatchHandler::new(Arc::new(chain), invoker)
    }

    #[tokio::test]
    async fn test_happy_path_writes_result() {
        let handler = handler(Arc::new(StubInvoker {
            payload: r#"{"devices": []}"#,
            stage_header: false,
        }));

        let response = handler
            .dispatch(InboundRequest::new(Method::GET, "/devices"))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert!(response.headers().get(REQUEST_ID_HEADER).is_some());
        let body: Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body, json!({ "devices": [] }));
    }

    #[tokio::test]
    async fn test_staged_headers_reach_the_wire() {
        let handler = handler(Arc::new(StubInvoker {
            payload: "{}",
            stage_header: true,
        }));

        let response = handler
            .dispatch(InboundRequest::new(Method::GET, "/devices"))
            .await;
        assert_eq!(response.headers().get("x-api-version").unwrap(), "2");
    }

    #[tokio::test]
    async fn test_unmatched_route_yields_envelope() {
        let handler = handler(Arc::new(StubInvoker {
            payload: "{}",
            stage_header: false,
        }));

        let response = handler
            .dispatch(InboundRequest::new(Method::GET, "/missing"))
            .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["code"], 1005);
        assert!(body["message"].as_str().unwrap().contains("/missing"));
        assert_eq!(body.as_object().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_backend_payload_yields_envelope() {
        let handler = handler(Arc::new(StubInvoker {
            payload: "not json",
            stage_header: false,
        }));

        let response = handler
            .dispatch(InboundRequest::new(Method::GET, "/devices"))
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["code"], 1001);
    }

    #[tokio::test]
    async fn test_missing_result_is_internal_error() {
        let handler = handler(Arc::new(ForgetfulInvoker));

        let response = handler
            .dispatch(InboundRequest::new(Method::GET, "/devices"))
            .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["code"], 1500);
    }

    #[tokio::test]
    async fn test_request_id_header_matches_uuid_shape() {
        let handler = handler(Arc::new(StubInvoker {
            payload: "{}",
            stage_header: false,
        }));

        let response = handler
            .dispatch(InboundRequest::new(Method::GET, "/devices"))
            .await;
        let id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .unwrap()
            .to_str()
            .unwrap();
        assert_eq!(id.len(), 36);
    }
}
