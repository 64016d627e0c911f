//! Polymorphic plugins attached to API definitions.
//!
//! A plugin is an encodable configuration object (an access-restriction
//! list, a rate-limit policy, ...) identified by a stable kind name. The
//! core treats plugins opaquely: it guarantees at most one instance per kind
//! on a definition and exposes lookup by kind; filters downcast to the
//! concrete type they understand.
//!
//! Discovery is an explicit registry of codecs populated at process start.
//! There is no runtime scanning.

use crate::error::{GatewayError, GatewayResult};
use indexmap::IndexMap;
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;

/// A polymorphic extension object attached to an [`ApiDefinition`].
///
/// [`ApiDefinition`]: crate::definition::ApiDefinition
pub trait ApiPlugin: std::fmt::Debug + Send + Sync + 'static {
    /// The stable kind name, also the registry key.
    fn kind(&self) -> &'static str;

    /// Encodes this plugin to its configuration document.
    fn encode(&self) -> Value;

    /// Upcast for downcasting to the concrete plugin type.
    fn as_any(&self) -> &dyn Any;
}

/// Decoder for one plugin kind.
///
/// Each kind provides a codec used when definitions are (de)serialized.
pub trait PluginCodec: Send + Sync + 'static {
    /// The plugin kind this codec handles.
    fn kind(&self) -> &'static str;

    /// Decodes a configuration document into a plugin instance.
    fn decode(&self, doc: &Value) -> GatewayResult<Arc<dyn ApiPlugin>>;
}

/// Name-keyed registry of plugin codecs.
///
/// # Example
///
/// ```ignore
/// let mut registry = PluginCodecRegistry::new();
/// registry.register(Arc::new(IpRestrictionCodec));
/// registry.register(Arc::new(RateLimitCodec));
/// ```
#[derive(Default)]
pub struct PluginCodecRegistry {
    codecs: IndexMap<&'static str, Arc<dyn PluginCodec>>,
}

impl PluginCodecRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a codec, replacing any codec already present for the kind.
    pub fn register(&mut self, codec: Arc<dyn PluginCodec>) {
        let kind = codec.kind();
        if self.codecs.insert(kind, codec).is_some() {
            tracing::warn!(kind, "plugin codec replaced");
        }
    }

    /// Returns the codec for a kind, if registered.
    #[must_use]
    pub fn get(&self, kind: &str) -> Option<&Arc<dyn PluginCodec>> {
        self.codecs.get(kind)
    }

    /// Decodes a document for the given kind.
    ///
    /// Fails with a validation error for unknown kinds: a definition naming
    /// a plugin nobody can decode is a configuration defect.
    pub fn decode(&self, kind: &str, doc: &Value) -> GatewayResult<Arc<dyn ApiPlugin>> {
        let codec = self
            .get(kind)
            .ok_or_else(|| GatewayError::validation(format!("unknown plugin kind '{kind}'")))?;
        codec.decode(doc)
    }

    /// Returns the registered kinds in registration order.
    pub fn kinds(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.codecs.keys().copied()
    }
}

impl std::fmt::Debug for PluginCodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginCodecRegistry")
            .field("kinds", &self.codecs.keys().collect::<Vec<_>>())
            .finish()
    }
}
