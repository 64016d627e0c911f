//! The HTTP boundary contract.
//!
//! The gateway core does not own a listener. Whatever server fronts it
//! converts its native request type into an [`InboundRequest`], calls the
//! dispatch handler, and writes the returned [`OutboundResponse`] back out.

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use indexmap::IndexMap;

/// An inbound request, decoupled from any particular server.
///
/// # Example
///
/// ```
/// use http::Method;
/// use propylaea_gateway::InboundRequest;
///
/// let request = InboundRequest::new(Method::GET, "/user/42")
///     .with_param("expand", "profile")
///     .with_header("x-forwarded-for", "10.0.0.9");
/// assert_eq!(request.path(), "/user/42");
/// ```
#[derive(Debug, Clone)]
pub struct InboundRequest {
    method: Method,
    path: String,
    headers: HeaderMap,
    params: IndexMap<String, Vec<String>>,
    body: Option<Bytes>,
}

impl InboundRequest {
    /// Creates a request with a method and path.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            params: IndexMap::new(),
            body: None,
        }
    }

    /// Adds a header. Invalid names or values are silently dropped; the
    /// fronting server has already validated its own wire input.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Replaces the full header map.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Appends a query parameter value.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.entry(name.into()).or_default().push(value.into());
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn with_body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
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

    /// Returns the headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the query parameters.
    #[must_use]
    pub const fn params(&self) -> &IndexMap<String, Vec<String>> {
        &self.params
    }

    /// Returns the body, if any.
    #[must_use]
    pub const fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Decomposes the request into its parts.
    #[must_use]
    pub fn into_parts(
        self,
    ) -> (
        Method,
        String,
        HeaderMap,
        IndexMap<String, Vec<String>>,
        Option<Bytes>,
    ) {
        (self.method, self.path, self.headers, self.params, self.body)
    }
}

/// An outbound response, ready for whatever server fronts the gateway.
#[derive(Debug, Clone)]
pub struct OutboundResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl OutboundResponse {
    /// Creates a response.
    #[must_use]
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Returns the status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the body bytes.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }
}
