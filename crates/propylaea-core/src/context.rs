//! Per-request context types.
//!
//! The [`ApiContext`] is created once per inbound request, mutated by filters
//! in sequence, and destroyed after the response is written. It is
//! exclusively owned by its request's pipeline run and never shared across
//! requests.

use crate::definition::ApiDefinition;
use crate::error::{GatewayError, GatewayResult};
use crate::result::ApiResult;
use http::{HeaderMap, Method};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which makes it ideal for request tracking and
/// log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID using UUID v7.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `RequestId` from an existing UUID.
    ///
    /// Useful when the ID was propagated from an upstream service.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Prefix for context variables that become response headers.
///
/// A variable `resp.header:x-api-version = "2"` makes the dispatch handler
/// write an `x-api-version: 2` response header.
pub const RESPONSE_HEADER_PREFIX: &str = "resp.header:";

/// Per-request mutable state threaded through the filter pipeline.
///
/// The request facts (method, path, headers, query parameters, body) are
/// immutable after creation. Resolved state — the matched definition, the
/// authenticated principal, cross-filter variables and the backend result —
/// starts empty and is filled in by filters.
///
/// # Invariants
///
/// - Once the matched [`ApiDefinition`] is set it is never replaced, only
///   read; [`ApiContext::set_api_definition`] enforces this.
/// - The result must be present before the response-writing step, or the
///   request fails.
///
/// # Example
///
/// ```
/// use http::Method;
/// use propylaea_core::ApiContext;
///
/// let ctx = ApiContext::new(Method::GET, "/devices");
/// assert!(ctx.api_definition().is_none());
/// assert!(ctx.result().is_none());
/// ```
#[derive(Debug)]
pub struct ApiContext {
    /// Unique identifier for this request.
    id: RequestId,

    /// HTTP method of the inbound request.
    method: Method,

    /// Path of the inbound request, without the query string.
    path: String,

    /// Request headers. Multi-valued, case-insensitive keys.
    headers: HeaderMap,

    /// Query parameters. Multi-valued, in arrival order.
    params: IndexMap<String, Vec<String>>,

    /// Raw request body, if any.
    body: Option<bytes::Bytes>,

    /// The matched API definition. Set exactly once by the match filter.
    api_definition: Option<Arc<ApiDefinition>>,

    /// The authenticated principal's claims, set by an authentication filter.
    principal: Option<Value>,

    /// Generic key-to-value map for cross-filter communication.
    variables: IndexMap<String, Value>,

    /// The backend result, consumed by POST filters and the final writer.
    result: Option<ApiResult>,

    /// When the request started processing.
    started_at: Instant,
}

impl ApiContext {
    /// Creates a context with just a method and path.
    ///
    /// Convenient for filters that only look at routing facts, and in tests.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self::with_request(method, path, HeaderMap::new(), IndexMap::new(), None)
    }

    /// Creates a context from the full set of inbound request facts.
    #[must_use]
    pub fn with_request(
        method: Method,
        path: impl Into<String>,
        headers: HeaderMap,
        params: IndexMap<String, Vec<String>>,
        body: Option<bytes::Bytes>,
    ) -> Self {
        Self {
            id: RequestId::new(),
            method,
            path: path.into(),
            headers,
            params,
            body,
            api_definition: None,
            principal: None,
            variables: IndexMap::new(),
            result: None,
            started_at: Instant::now(),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub const fn id(&self) -> RequestId {
        self.id
    }

    /// Returns the HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the request headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the query parameters.
    #[must_use]
    pub const fn params(&self) -> &IndexMap<String, Vec<String>> {
        &self.params
    }

    /// Returns the raw request body, if any.
    #[must_use]
    pub const fn body(&self) -> Option<&bytes::Bytes> {
        self.body.as_ref()
    }

    /// Returns the matched API definition, if routing has run.
    #[must_use]
    pub const fn api_definition(&self) -> Option<&Arc<ApiDefinition>> {
        self.api_definition.as_ref()
    }

    /// Sets the matched API definition.
    ///
    /// Fails with `IllegalState` if a definition was already set: the match
    /// is resolved exactly once per request.
    pub fn set_api_definition(&mut self, definition: Arc<ApiDefinition>) -> GatewayResult<()> {
        if let Some(existing) = &self.api_definition {
            return Err(GatewayError::illegal_state(format!(
                "api definition already resolved to '{}'",
                existing.name()
            )));
        }
        self.api_definition = Some(definition);
        Ok(())
    }

    /// Returns the authenticated principal's claims, if set.
    #[must_use]
    pub const fn principal(&self) -> Option<&Value> {
        self.principal.as_ref()
    }

    /// Sets the authenticated principal.
    pub fn set_principal(&mut self, principal: Value) {
        self.principal = Some(principal);
    }

    /// Returns a cross-filter variable.
    #[must_use]
    pub fn variable(&self, key: &str) -> Option<&Value> {
        self.variables.get(key)
    }

    /// Sets a cross-filter variable, replacing any previous value.
    pub fn set_variable(&mut self, key: impl Into<String>, value: Value) {
        self.variables.insert(key.into(), value);
    }

    /// Returns all cross-filter variables.
    #[must_use]
    pub const fn variables(&self) -> &IndexMap<String, Value> {
        &self.variables
    }

    /// Returns the backend result, if set.
    #[must_use]
    pub const fn result(&self) -> Option<&ApiResult> {
        self.result.as_ref()
    }

    /// Sets the backend result.
    ///
    /// POST filters may replace the result while shaping the response.
    pub fn set_result(&mut self, result: ApiResult) {
        self.result = Some(result);
    }

    /// Takes the backend result, failing if none was produced.
    pub fn take_result(&mut self) -> GatewayResult<ApiResult> {
        self.result
            .take()
            .ok_or_else(|| GatewayError::illegal_state("no result set before response writing"))
    }

    /// Returns the elapsed time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }
}
