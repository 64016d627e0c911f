//! The published-definition registry.
//!
//! The registry is the only mutable shared state in the gateway core.
//! Readers take a shared reference to the current [`RegistrySnapshot`];
//! publishers build a fresh snapshot and swap the handle under a single
//! atomic operation, so a match in progress never observes a half-updated
//! registry. Snapshots are method-partitioned so matching only scans the
//! method's own candidates.

use crate::matcher;
use arc_swap::ArcSwap;
use http::Method;
use parking_lot::Mutex;
use propylaea_core::{ApiDefinition, GatewayError, GatewayResult, PathPattern};
use std::collections::HashMap;
use std::sync::Arc;

/// An immutable, fully-built view of the published definitions.
#[derive(Debug, Default)]
pub struct RegistrySnapshot {
    by_method: HashMap<Method, Vec<Arc<ApiDefinition>>>,
    by_name: HashMap<String, Arc<ApiDefinition>>,
}

impl RegistrySnapshot {
    /// Builds a snapshot, rejecting configuration defects.
    ///
    /// Two definitions with the same name, or with an identical
    /// (method, literal path) pair, fail with `Conflict`.
    fn build(definitions: &[Arc<ApiDefinition>]) -> GatewayResult<Self> {
        let mut by_method: HashMap<Method, Vec<Arc<ApiDefinition>>> = HashMap::new();
        let mut by_name: HashMap<String, Arc<ApiDefinition>> = HashMap::new();
        let mut literals: HashMap<(Method, &str), &str> = HashMap::new();

        for definition in definitions {
            if let Some(previous) =
                by_name.insert(definition.name().to_string(), Arc::clone(definition))
            {
                return Err(GatewayError::conflict(format!(
                    "duplicate definition name '{}'",
                    previous.name()
                )));
            }
            if let PathPattern::Literal(path) = definition.pattern() {
                let key = (definition.method().clone(), path.as_str());
                if let Some(other) = literals.insert(key, definition.name()) {
                    return Err(GatewayError::conflict(format!(
                        "definitions '{other}' and '{}' both claim {} {path}",
                        definition.name(),
                        definition.method()
                    )));
                }
            }
            by_method
                .entry(definition.method().clone())
                .or_default()
                .push(Arc::clone(definition));
        }

        Ok(Self { by_method, by_name })
    }

    /// Returns the candidate definitions for a method.
    #[must_use]
    pub fn candidates(&self, method: &Method) -> &[Arc<ApiDefinition>] {
        self.by_method.get(method).map_or(&[], Vec::as_slice)
    }

    /// Resolves a (method, path) pair to exactly one definition.
    pub fn match_route(&self, method: &Method, path: &str) -> GatewayResult<Arc<ApiDefinition>> {
        matcher::match_route(self.candidates(method), method, path)
    }

    /// Looks up a definition by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<ApiDefinition>> {
        self.by_name.get(name)
    }

    /// Returns the number of published definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Returns true if no definitions are published.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// The registry of published [`ApiDefinition`]s.
///
/// Shared read-mostly across all concurrent requests. `publish`,
/// `unpublish` and `reload` apply as atomic snapshot swaps.
///
/// # Example
///
/// ```
/// use http::Method;
/// use propylaea_core::{ApiDefinition, HttpEndpoint, PathPattern};
/// use propylaea_router::ApiRegistry;
///
/// let registry = ApiRegistry::new();
/// registry.publish(ApiDefinition::new(
///     "list_devices",
///     Method::GET,
///     PathPattern::literal("/devices"),
///     vec![HttpEndpoint::new("main", "device", Method::GET, "/devices")],
/// )?)?;
///
/// let found = registry.match_route(&Method::GET, "/devices")?;
/// assert_eq!(found.name(), "list_devices");
/// # Ok::<(), propylaea_core::GatewayError>(())
/// ```
#[derive(Debug)]
pub struct ApiRegistry {
    snapshot: ArcSwap<RegistrySnapshot>,
    // Publish-order source of truth, touched only under the writer lock.
    writer: Mutex<Vec<Arc<ApiDefinition>>>,
}

impl Default for ApiRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(RegistrySnapshot::default()),
            writer: Mutex::new(Vec::new()),
        }
    }

    /// Publishes a definition.
    ///
    /// A definition with the same name is replaced wholesale. A definition
    /// whose (method, literal path) collides with a different published
    /// definition is rejected with `Conflict` and the registry is left
    /// unchanged.
    pub fn publish(&self, definition: ApiDefinition) -> GatewayResult<()> {
        let definition = Arc::new(definition);
        let mut writer = self.writer.lock();

        let mut next: Vec<Arc<ApiDefinition>> = writer
            .iter()
            .filter(|d| d.name() != definition.name())
            .cloned()
            .collect();
        next.push(Arc::clone(&definition));

        let snapshot = RegistrySnapshot::build(&next)?;
        *writer = next;
        self.snapshot.store(Arc::new(snapshot));
        tracing::info!(
            name = definition.name(),
            method = %definition.method(),
            path = definition.pattern().raw(),
            "api published"
        );
        Ok(())
    }

    /// Removes a definition by name.
    pub fn unpublish(&self, name: &str) -> GatewayResult<()> {
        let mut writer = self.writer.lock();
        let before = writer.len();
        let next: Vec<Arc<ApiDefinition>> =
            writer.iter().filter(|d| d.name() != name).cloned().collect();
        if next.len() == before {
            return Err(GatewayError::not_found(format!(
                "no published definition named '{name}'"
            )));
        }

        let snapshot = RegistrySnapshot::build(&next)?;
        *writer = next;
        self.snapshot.store(Arc::new(snapshot));
        tracing::info!(name, "api unpublished");
        Ok(())
    }

    /// Replaces the entire published set in one swap.
    ///
    /// On any conflict within the new set the registry keeps its previous
    /// snapshot untouched.
    pub fn reload(&self, definitions: Vec<ApiDefinition>) -> GatewayResult<()> {
        let definitions: Vec<Arc<ApiDefinition>> =
            definitions.into_iter().map(Arc::new).collect();
        let mut writer = self.writer.lock();

        let snapshot = RegistrySnapshot::build(&definitions)?;
        let count = definitions.len();
        *writer = definitions;
        self.snapshot.store(Arc::new(snapshot));
        tracing::info!(count, "api registry reloaded");
        Ok(())
    }

    /// Returns the current snapshot.
    ///
    /// The snapshot stays valid for the caller even if a publisher swaps in
    /// a newer one meanwhile.
    #[must_use]
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.snapshot.load_full()
    }

    /// Resolves a (method, path) pair against the current snapshot.
    pub fn match_route(&self, method: &Method, path: &str) -> GatewayResult<Arc<ApiDefinition>> {
        self.snapshot.load().match_route(method, path)
    }
}
