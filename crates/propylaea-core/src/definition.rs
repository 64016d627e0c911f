//! API definitions: the registered routes of the gateway.
//!
//! An [`ApiDefinition`] describes one logical API: a stable name, an HTTP
//! method, a path pattern (exact literal, ant-style wildcard or anchored
//! regex), the ordered backend endpoints to invoke, the filters applicable
//! to it, and its attached plugins (at most one per kind).
//!
//! Definitions are decoded from JSON documents at import time by a
//! [`DefinitionCodec`], are immutable once published, and are replaced
//! wholesale on reload.

use crate::error::{GatewayError, GatewayResult};
use crate::plugin::{ApiPlugin, PluginCodecRegistry};
use http::Method;
use indexmap::IndexMap;
use serde_json::{json, Value};
use std::sync::Arc;

/// One segment of a parsed ant-style pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AntSegment {
    /// A literal segment that must match exactly.
    Literal(String),
    /// `*`: matches exactly one path segment.
    Star,
    /// `**`: matches any number of trailing segments, including none.
    DoubleStar,
}

/// A parsed ant-style wildcard pattern.
///
/// `*` matches exactly one path segment, `**` matches any number of trailing
/// segments. `**` is only valid as the last segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AntPattern {
    raw: String,
    segments: Vec<AntSegment>,
}

impl AntPattern {
    /// Parses an ant-style pattern, validating `**` placement.
    pub fn parse(raw: impl Into<String>) -> GatewayResult<Self> {
        let raw = raw.into();
        let mut segments = Vec::new();
        let parts: Vec<&str> = raw.split('/').filter(|s| !s.is_empty()).collect();
        for (i, part) in parts.iter().enumerate() {
            let segment = match *part {
                "*" => AntSegment::Star,
                "**" => {
                    if i + 1 != parts.len() {
                        return Err(GatewayError::validation(format!(
                            "'**' must be the last segment of ant pattern '{raw}'"
                        )));
                    }
                    AntSegment::DoubleStar
                }
                literal => AntSegment::Literal(literal.to_string()),
            };
            segments.push(segment);
        }
        Ok(Self { raw, segments })
    }

    /// Returns the raw pattern text.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns the parsed segments.
    #[must_use]
    pub fn segments(&self) -> &[AntSegment] {
        &self.segments
    }
}

/// A compiled, fully-anchored regex pattern.
#[derive(Debug, Clone)]
pub struct RegexPattern {
    raw: String,
    regex: regex::Regex,
}

impl RegexPattern {
    /// Compiles a regex pattern, anchoring it to the full path.
    pub fn compile(raw: impl Into<String>) -> GatewayResult<Self> {
        let raw = raw.into();
        let regex = regex::Regex::new(&format!("^(?:{raw})$"))
            .map_err(|e| GatewayError::validation(format!("invalid regex pattern: {e}")))?;
        Ok(Self { raw, regex })
    }

    /// Returns the raw pattern text as written in the definition.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns the compiled, anchored regex.
    #[must_use]
    pub const fn regex(&self) -> &regex::Regex {
        &self.regex
    }
}

impl PartialEq for RegexPattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for RegexPattern {}

/// The path pattern of a definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    /// An exact, case-sensitive literal path.
    Literal(String),
    /// An ant-style wildcard pattern.
    Ant(AntPattern),
    /// An anchored regular expression.
    Regex(RegexPattern),
}

impl PathPattern {
    /// Creates an exact-literal pattern.
    #[must_use]
    pub fn literal(path: impl Into<String>) -> Self {
        Self::Literal(path.into())
    }

    /// Parses an ant-style pattern.
    pub fn ant(pattern: impl Into<String>) -> GatewayResult<Self> {
        Ok(Self::Ant(AntPattern::parse(pattern)?))
    }

    /// Compiles a regex pattern.
    pub fn regex(pattern: impl Into<String>) -> GatewayResult<Self> {
        Ok(Self::Regex(RegexPattern::compile(pattern)?))
    }

    /// Parses a pattern from its raw text and an optional explicit kind.
    ///
    /// Without an explicit kind, a path containing `*` is ant-style and
    /// anything else is a literal. Regex is never inferred: a regex silently
    /// misread as a literal would shadow routes, so it must be opted into.
    pub fn parse(raw: &str, kind: Option<&str>) -> GatewayResult<Self> {
        match kind {
            Some("literal") => Ok(Self::literal(raw)),
            Some("ant") => Self::ant(raw),
            Some("regex") => Self::regex(raw),
            Some(other) => Err(GatewayError::validation(format!(
                "unknown path kind '{other}' (expected literal, ant or regex)"
            ))),
            None if raw.contains('*') => Self::ant(raw),
            None => Ok(Self::literal(raw)),
        }
    }

    /// Returns the raw pattern text.
    #[must_use]
    pub fn raw(&self) -> &str {
        match self {
            Self::Literal(path) => path,
            Self::Ant(ant) => ant.raw(),
            Self::Regex(re) => re.raw(),
        }
    }

    /// Returns the kind name used in definition documents.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Literal(_) => "literal",
            Self::Ant(_) => "ant",
            Self::Regex(_) => "regex",
        }
    }
}

/// A backend HTTP endpoint of a definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpEndpoint {
    name: String,
    service: String,
    method: Method,
    path: String,
}

impl HttpEndpoint {
    /// Creates an endpoint.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        service: impl Into<String>,
        method: Method,
        path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            service: service.into(),
            method,
            path: path.into(),
        }
    }

    /// Returns the endpoint name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the logical service name used for discovery.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Returns the backend HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the backend path template.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// One logical API registered with the gateway.
///
/// Immutable once published; replaced wholesale (never mutated in place) on
/// reload.
#[derive(Debug, Clone)]
pub struct ApiDefinition {
    name: String,
    method: Method,
    pattern: PathPattern,
    endpoints: Vec<HttpEndpoint>,
    filters: Vec<String>,
    plugins: IndexMap<&'static str, Arc<dyn ApiPlugin>>,
}

impl ApiDefinition {
    /// Creates a definition.
    ///
    /// The name must be non-empty and at least one endpoint is required.
    pub fn new(
        name: impl Into<String>,
        method: Method,
        pattern: PathPattern,
        endpoints: Vec<HttpEndpoint>,
    ) -> GatewayResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(GatewayError::validation("definition name must not be empty"));
        }
        if endpoints.is_empty() {
            return Err(GatewayError::validation(format!(
                "definition '{name}' must declare at least one endpoint"
            )));
        }
        Ok(Self {
            name,
            method,
            pattern,
            endpoints,
            filters: Vec::new(),
            plugins: IndexMap::new(),
        })
    }

    /// Sets the ordered list of filter names applicable to this API.
    #[must_use]
    pub fn with_filters(mut self, filters: Vec<String>) -> Self {
        self.filters = filters;
        self
    }

    /// Attaches a plugin, replacing any plugin of the same kind.
    ///
    /// A definition carries at most one plugin per kind.
    #[must_use]
    pub fn with_plugin(mut self, plugin: Arc<dyn ApiPlugin>) -> Self {
        self.plugins.insert(plugin.kind(), plugin);
        self
    }

    /// Returns the unique name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the path pattern.
    #[must_use]
    pub const fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// Returns the ordered backend endpoints.
    #[must_use]
    pub fn endpoints(&self) -> &[HttpEndpoint] {
        &self.endpoints
    }

    /// Returns the ordered filter names.
    #[must_use]
    pub fn filters(&self) -> &[String] {
        &self.filters
    }

    /// Looks up a plugin by kind.
    #[must_use]
    pub fn plugin(&self, kind: &str) -> Option<&Arc<dyn ApiPlugin>> {
        self.plugins.get(kind)
    }

    /// Looks up a plugin by kind and downcasts it to its concrete type.
    #[must_use]
    pub fn plugin_as<T: ApiPlugin>(&self, kind: &str) -> Option<&T> {
        self.plugins
            .get(kind)
            .and_then(|p| p.as_any().downcast_ref())
    }

    /// Returns the attached plugin kinds in attachment order.
    pub fn plugin_kinds(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.plugins.keys().copied()
    }
}

/// JSON codec for [`ApiDefinition`] documents.
///
/// Carries the plugin codec registry so attached plugins round-trip through
/// their own codecs.
///
/// # Document shape
///
/// ```json
/// {
///   "name": "get_user",
///   "method": "GET",
///   "path": "/user/\\d+",
///   "pathKind": "regex",
///   "endpoints": [
///     { "name": "main", "service": "user", "method": "GET", "path": "/users" }
///   ],
///   "filters": ["service_discovery"],
///   "plugins": { "rate.limit": { "limit": 100, "windowSeconds": 60 } }
/// }
/// ```
#[derive(Debug)]
pub struct DefinitionCodec {
    plugins: PluginCodecRegistry,
}

impl DefinitionCodec {
    /// Creates a codec with the given plugin registry.
    #[must_use]
    pub fn new(plugins: PluginCodecRegistry) -> Self {
        Self { plugins }
    }

    /// Returns the plugin codec registry.
    #[must_use]
    pub const fn plugin_registry(&self) -> &PluginCodecRegistry {
        &self.plugins
    }

    /// Encodes a definition to its document form.
    #[must_use]
    pub fn encode(&self, definition: &ApiDefinition) -> Value {
        let endpoints: Vec<Value> = definition
            .endpoints()
            .iter()
            .map(|e| {
                json!({
                    "name": e.name(),
                    "service": e.service(),
                    "method": e.method().as_str(),
                    "path": e.path(),
                })
            })
            .collect();

        let mut plugins = serde_json::Map::new();
        for kind in definition.plugin_kinds() {
            if let Some(plugin) = definition.plugin(kind) {
                plugins.insert(kind.to_string(), plugin.encode());
            }
        }

        json!({
            "name": definition.name(),
            "method": definition.method().as_str(),
            "path": definition.pattern().raw(),
            "pathKind": definition.pattern().kind_name(),
            "endpoints": endpoints,
            "filters": definition.filters(),
            "plugins": Value::Object(plugins),
        })
    }

    /// Decodes a definition document.
    pub fn decode(&self, doc: &Value) -> GatewayResult<ApiDefinition> {
        let name = required_str(doc, "name")?;
        let method = parse_method(required_str(doc, "method")?)?;
        let path = required_str(doc, "path")?;
        let kind = doc.get("pathKind").and_then(Value::as_str);
        let pattern = PathPattern::parse(path, kind)?;

        let endpoints = doc
            .get("endpoints")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                GatewayError::validation(format!("definition '{name}' has no endpoints array"))
            })?
            .iter()
            .map(|e| {
                Ok(HttpEndpoint::new(
                    required_str(e, "name")?,
                    required_str(e, "service")?,
                    parse_method(required_str(e, "method")?)?,
                    required_str(e, "path")?,
                ))
            })
            .collect::<GatewayResult<Vec<_>>>()?;

        let filters = doc
            .get("filters")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(Value::as_str)
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let mut definition =
            ApiDefinition::new(name, method, pattern, endpoints)?.with_filters(filters);

        if let Some(plugin_docs) = doc.get("plugins").and_then(Value::as_object) {
            for (kind, plugin_doc) in plugin_docs {
                let plugin = self.plugins.decode(kind, plugin_doc)?;
                definition = definition.with_plugin(plugin);
            }
        }

        Ok(definition)
    }
}

fn required_str<'a>(doc: &'a Value, field: &str) -> GatewayResult<&'a str> {
    doc.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| GatewayError::validation(format!("missing string field '{field}'")))
}

fn parse_method(raw: &str) -> GatewayResult<Method> {
    // Methods are matched case-insensitively at the boundary.
    Method::from_bytes(raw.to_ascii_uppercase().as_bytes())
        .map_err(|_| GatewayError::validation(format!("invalid HTTP method '{raw}'")))
}
