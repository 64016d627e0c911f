//! The filter contract.
//!
//! A filter is one asynchronous, potentially failing transformation of the
//! per-request [`ApiContext`]. Filters declare a phase (before or after the
//! backend result exists), a numeric order within the phase, and an
//! applicability predicate; the chain takes care of sequencing.
//!
//! Filters are discovered through an explicit [`FilterRegistry`] of
//! factories populated at process start. There is no runtime scanning.

use propylaea_core::{ApiContext, GatewayError, GatewayResult, Task};
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

/// The phase a filter runs in.
///
/// `Pre` filters run before the backend result exists and typically guard
/// or enrich the request; `Post` filters shape the result before it is
/// written. There is no phase after the response is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterPhase {
    /// Before the backend result exists.
    Pre,
    /// After the backend result exists, before the response is written.
    Post,
}

impl std::fmt::Display for FilterPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pre => f.write_str("pre"),
            Self::Post => f.write_str("post"),
        }
    }
}

/// One transformation stage of the request pipeline.
///
/// # Invariants
///
/// - A filter never blocks the calling thread; slow work belongs on the
///   [`Task`] it returns.
/// - A filter that fails aborts the rest of its chain; the error reaches
///   the client through the dispatch handler's envelope mapping.
/// - `should_apply` must be cheap. It runs for every request reaching the
///   filter's chain.
pub trait Filter: Send + Sync + 'static {
    /// The unique name of this filter, used in definitions and logs.
    fn name(&self) -> &'static str;

    /// The phase this filter runs in.
    fn phase(&self) -> FilterPhase;

    /// Position within the phase. Lower runs first; ties keep registration
    /// order.
    fn order(&self) -> i32 {
        1000
    }

    /// Returns true if this filter applies to the given request.
    fn should_apply(&self, ctx: &ApiContext) -> bool {
        let _ = ctx;
        true
    }

    /// Applies the filter, taking ownership of the context and handing it
    /// back through the returned task.
    fn apply(&self, ctx: ApiContext) -> Task<ApiContext>;
}

impl std::fmt::Debug for dyn Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Filter")
            .field("name", &self.name())
            .field("phase", &self.phase())
            .finish()
    }
}

/// Creates filter instances from their configuration documents.
///
/// One factory per filter name; the chain builder instantiates each
/// configured filter exactly once and shares it across requests.
pub trait FilterFactory: Send + Sync + 'static {
    /// The filter name this factory builds.
    fn name(&self) -> &'static str;

    /// Builds a filter from its configuration document.
    fn create(&self, config: &Value) -> GatewayResult<Arc<dyn Filter>>;
}

/// Name-keyed registry of filter factories.
#[derive(Default)]
pub struct FilterRegistry {
    factories: IndexMap<&'static str, Arc<dyn FilterFactory>>,
}

impl FilterRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory, replacing any factory already present for the
    /// name.
    pub fn register(&mut self, factory: Arc<dyn FilterFactory>) {
        let name = factory.name();
        if self.factories.insert(name, factory).is_some() {
            tracing::warn!(name, "filter factory replaced");
        }
    }

    /// Returns the factory for a name, if registered.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn FilterFactory>> {
        self.factories.get(name)
    }

    /// Builds the filter for a name.
    ///
    /// Fails with a validation error for unknown names: a configuration
    /// naming a filter nobody provides is a defect.
    pub fn create(&self, name: &str, config: &Value) -> GatewayResult<Arc<dyn Filter>> {
        let factory = self
            .get(name)
            .ok_or_else(|| GatewayError::validation(format!("unknown filter '{name}'")))?;
        factory.create(config)
    }

    /// Returns the registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }
}

impl std::fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterRegistry")
            .field("names", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
