//! The filter chain.
//!
//! A [`FilterChain`] is built once from the configured filters, sorted by
//! phase then order (ties keep registration order), and shared immutably
//! across all requests. Running a chain folds its filters into a single
//! [`Task`] via sequential composition: a failed filter aborts the rest of
//! the chain, a skipped filter passes the context through untouched.

use crate::filter::{Filter, FilterPhase, FilterRegistry};
use indexmap::IndexMap;
use propylaea_core::{ApiContext, GatewayResult, Task};
use serde_json::Value;
use std::sync::Arc;

/// Hook observing the context after each successfully applied filter.
///
/// The observer is diagnostic only. It receives the filter's name and a
/// shared view of the context; it cannot fail the chain.
pub type ChainObserver = Arc<dyn Fn(&'static str, &ApiContext) + Send + Sync + 'static>;

/// An immutable, phase-partitioned sequence of filters.
///
/// # Example
///
/// ```ignore
/// let chain = FilterChain::builder()
///     .filter(Arc::new(ApiMatchFilter::new(registry)))
///     .filter(Arc::new(ResponseTransformerFilter))
///     .build();
///
/// let ctx = chain.run_pre(ctx).await?;
/// ```
pub struct FilterChain {
    pre: Vec<Arc<dyn Filter>>,
    post: Vec<Arc<dyn Filter>>,
    observer: Option<ChainObserver>,
}

impl FilterChain {
    /// Creates a chain builder.
    #[must_use]
    pub fn builder() -> FilterChainBuilder {
        FilterChainBuilder::new()
    }

    /// Builds a chain by instantiating each configured filter through the
    /// registry, in configuration order.
    pub fn from_registry(
        registry: &FilterRegistry,
        configs: &IndexMap<String, Value>,
    ) -> GatewayResult<Self> {
        let mut builder = Self::builder();
        for (name, config) in configs {
            builder = builder.filter(registry.create(name, config)?);
        }
        Ok(builder.build())
    }

    /// Returns the PRE-phase filters in execution order.
    #[must_use]
    pub fn pre(&self) -> &[Arc<dyn Filter>] {
        &self.pre
    }

    /// Returns the POST-phase filters in execution order.
    #[must_use]
    pub fn post(&self) -> &[Arc<dyn Filter>] {
        &self.post
    }

    /// Runs the PRE-phase filters over the context.
    #[must_use]
    pub fn run_pre(&self, ctx: ApiContext) -> Task<ApiContext> {
        Self::run(&self.pre, self.observer.clone(), ctx)
    }

    /// Runs the POST-phase filters over the context.
    #[must_use]
    pub fn run_post(&self, ctx: ApiContext) -> Task<ApiContext> {
        Self::run(&self.post, self.observer.clone(), ctx)
    }

    fn run(
        filters: &[Arc<dyn Filter>],
        observer: Option<ChainObserver>,
        ctx: ApiContext,
    ) -> Task<ApiContext> {
        let mut task = Task::succeeded(ctx);
        for filter in filters {
            let filter = Arc::clone(filter);
            let observer = observer.clone();
            let name = filter.name();
            task = task.and_then(name, move |ctx| async move {
                if !filter.should_apply(&ctx) {
                    tracing::debug!(filter = name, "filter skipped");
                    return Ok(ctx);
                }
                tracing::debug!(filter = name, "filter applied");
                let ctx = filter.apply(ctx).await?;
                if let Some(observer) = &observer {
                    observer(name, &ctx);
                }
                Ok(ctx)
            });
        }
        task
    }
}

impl std::fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = |filters: &[Arc<dyn Filter>]| {
            filters.iter().map(|f| f.name()).collect::<Vec<_>>()
        };
        f.debug_struct("FilterChain")
            .field("pre", &names(&self.pre))
            .field("post", &names(&self.post))
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

/// Builder for a [`FilterChain`].
#[derive(Default)]
pub struct FilterChainBuilder {
    filters: Vec<Arc<dyn Filter>>,
    observer: Option<ChainObserver>,
}

impl FilterChainBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter. Registration order breaks order ties.
    #[must_use]
    pub fn filter(mut self, filter: Arc<dyn Filter>) -> Self {
        self.filters.push(filter);
        self
    }

    /// Sets the chain observer.
    #[must_use]
    pub fn observe(mut self, observer: ChainObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Sorts the filters and builds the chain.
    #[must_use]
    pub fn build(mut self) -> FilterChain {
        // Stable sort: equal (phase, order) pairs keep registration order.
        self.filters.sort_by_key(|f| (f.phase(), f.order()));
        let (pre, post) = self
            .filters
            .into_iter()
            .partition(|f| f.phase() == FilterPhase::Pre);
        FilterChain {
            pre,
            post,
            observer: self.observer,
        }
    }
}
