//! The immutable response representation.
//!
//! An [`ApiResult`] is constructed exactly once per request, either by the
//! backend-invocation step or by an error handler, and carries everything
//! the dispatch handler needs to write the response: a JSON object or array
//! body, a status code, response headers and the originating request id.

use crate::context::RequestId;
use crate::error::{GatewayError, GatewayResult};
use http::{HeaderMap, StatusCode};
use serde_json::{Map, Value};

/// The tagged response body: a JSON object or a JSON array.
///
/// The tag decides the wire shape; clients never receive a bare scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultBody {
    /// A JSON object body.
    Object(Map<String, Value>),
    /// A JSON array body.
    Array(Vec<Value>),
}

impl ResultBody {
    /// Returns true if the body is a JSON array.
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    /// Encodes the body to its JSON text.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::Object(map) => Value::Object(map.clone()).to_string(),
            Self::Array(items) => Value::Array(items.clone()).to_string(),
        }
    }
}

/// Immutable response representation.
///
/// # Example
///
/// ```
/// use http::StatusCode;
/// use propylaea_core::{ApiResult, RequestId};
///
/// let id = RequestId::new();
/// let result = ApiResult::from_payload(id, StatusCode::OK, r#"{"ok": true}"#, http::HeaderMap::new())?;
/// assert!(!result.is_array());
/// # Ok::<(), propylaea_core::GatewayError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ApiResult {
    /// The originating request id.
    request_id: RequestId,
    /// Response status code.
    status_code: StatusCode,
    /// Tagged response body.
    body: ResultBody,
    /// Response headers. Multi-valued.
    headers: HeaderMap,
}

impl ApiResult {
    /// Creates a result with a JSON object body.
    #[must_use]
    pub fn json_object(
        request_id: RequestId,
        status_code: StatusCode,
        body: Map<String, Value>,
        headers: HeaderMap,
    ) -> Self {
        Self {
            request_id,
            status_code,
            body: ResultBody::Object(body),
            headers,
        }
    }

    /// Creates a result with a JSON array body.
    #[must_use]
    pub fn json_array(
        request_id: RequestId,
        status_code: StatusCode,
        body: Vec<Value>,
        headers: HeaderMap,
    ) -> Self {
        Self {
            request_id,
            status_code,
            body: ResultBody::Array(body),
            headers,
        }
    }

    /// Creates a result by classifying a raw backend payload.
    ///
    /// A payload bracketed by `{`/`}` must parse as a JSON object, one
    /// bracketed by `[`/`]` as a JSON array; anything else fails with
    /// `InvalidJson`. Leading and trailing whitespace is ignored.
    pub fn from_payload(
        request_id: RequestId,
        status_code: StatusCode,
        payload: &str,
        headers: HeaderMap,
    ) -> GatewayResult<Self> {
        let trimmed = payload.trim();
        if trimmed.starts_with('{') && trimmed.ends_with('}') {
            let parsed: Map<String, Value> = serde_json::from_str(trimmed)
                .map_err(|e| GatewayError::invalid_json(format!("not a JSON object: {e}")))?;
            return Ok(Self::json_object(request_id, status_code, parsed, headers));
        }
        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            let parsed: Vec<Value> = serde_json::from_str(trimmed)
                .map_err(|e| GatewayError::invalid_json(format!("not a JSON array: {e}")))?;
            return Ok(Self::json_array(request_id, status_code, parsed, headers));
        }
        Err(GatewayError::invalid_json(
            "payload is neither a JSON object nor a JSON array",
        ))
    }

    /// Creates a result from raw backend bytes.
    ///
    /// Non-UTF-8 payloads fail with `InvalidJson`.
    pub fn from_bytes(
        request_id: RequestId,
        status_code: StatusCode,
        payload: &[u8],
        headers: HeaderMap,
    ) -> GatewayResult<Self> {
        let text = std::str::from_utf8(payload)
            .map_err(|e| GatewayError::invalid_json(format!("payload is not UTF-8: {e}")))?;
        Self::from_payload(request_id, status_code, text, headers)
    }

    /// Returns the originating request id.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the status code.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.status_code
    }

    /// Returns true if the body is a JSON array.
    #[must_use]
    pub const fn is_array(&self) -> bool {
        self.body.is_array()
    }

    /// Returns the tagged body.
    #[must_use]
    pub const fn body(&self) -> &ResultBody {
        &self.body
    }

    /// Returns the response headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a mutable reference to the response headers.
    ///
    /// Used by POST filters shaping the response.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Returns a copy of this result with a different body.
    #[must_use]
    pub fn with_body(mut self, body: ResultBody) -> Self {
        self.body = body;
        self
    }

    /// Encodes the body to its JSON text.
    #[must_use]
    pub fn encode(&self) -> String {
        self.body.encode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn id() -> RequestId {
        RequestId::new()
    }

    #[test]
    fn test_object_payload() {
        let result =
            ApiResult::from_payload(id(), StatusCode::OK, r#"{"name": "d1"}"#, HeaderMap::new())
                .unwrap();
        assert!(!result.is_array());
        assert_eq!(result.encode(), r#"{"name":"d1"}"#);
    }

    #[test]
    fn test_array_payload() {
        let result =
            ApiResult::from_payload(id(), StatusCode::OK, r#"[1, 2, 3]"#, HeaderMap::new())
                .unwrap();
        assert!(result.is_array());
        assert_eq!(result.encode(), "[1,2,3]");
    }

    #[test]
    fn test_whitespace_is_tolerated() {
        let result =
            ApiResult::from_payload(id(), StatusCode::OK, "  {\"a\":1}\n", HeaderMap::new())
                .unwrap();
        assert!(!result.is_array());
    }

    #[test]
    fn test_scalar_payload_is_invalid_json() {
        let err = ApiResult::from_payload(id(), StatusCode::OK, "42", HeaderMap::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidJson);
    }

    #[test]
    fn test_malformed_object_is_invalid_json() {
        let err = ApiResult::from_payload(id(), StatusCode::OK, "{not json}", HeaderMap::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidJson);
    }

    #[test]
    fn test_from_bytes_rejects_non_utf8() {
        let err =
            ApiResult::from_bytes(id(), StatusCode::OK, &[0xff, 0xfe], HeaderMap::new())
                .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidJson);
    }

    #[test]
    fn test_headers_mutation() {
        let mut result =
            ApiResult::json_object(id(), StatusCode::OK, Map::new(), HeaderMap::new());
        result
            .headers_mut()
            .insert("x-api-version", http::HeaderValue::from_static("2"));
        assert_eq!(result.headers().get("x-api-version").unwrap(), "2");
    }
}
