//! The service discovery filter.
//!
//! Resolves every distinct backend service of the matched definition
//! concurrently through a [`ServiceDiscovery`] collaborator. All
//! resolutions must succeed; any failure maps to `UnknownRemote` and
//! discards the sibling results. Resolved addresses land in context
//! variables under [`SERVICE_VARIABLE_PREFIX`].
//!
//! The discovery registry itself (consul, static tables, ...) is an
//! external collaborator behind the trait.

use crate::filter::{Filter, FilterFactory, FilterPhase};
use propylaea_core::{ApiContext, GatewayError, GatewayResult, Task};
use serde_json::{json, Value};
use std::sync::Arc;

/// Prefix for context variables holding resolved service addresses.
///
/// The address of service `user` lands in `service.user`.
pub const SERVICE_VARIABLE_PREFIX: &str = "service.";

/// One resolved instance of a backend service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInstance {
    service: String,
    host: String,
    port: u16,
}

impl ServiceInstance {
    /// Creates an instance.
    #[must_use]
    pub fn new(service: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            service: service.into(),
            host: host.into(),
            port,
        }
    }

    /// Returns the logical service name.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Returns the `host:port` address.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Resolves logical service names to concrete instances.
pub trait ServiceDiscovery: Send + Sync + 'static {
    /// Resolves one service name.
    ///
    /// The returned task fails when the service is unknown or the
    /// discovery backend is unreachable.
    fn resolve(&self, service: &str) -> Task<ServiceInstance>;
}

/// Resolves the matched definition's backend services ahead of invocation.
pub struct ServiceDiscoveryFilter {
    discovery: Arc<dyn ServiceDiscovery>,
}

impl ServiceDiscoveryFilter {
    /// Creates the filter over a discovery collaborator.
    #[must_use]
    pub fn new(discovery: Arc<dyn ServiceDiscovery>) -> Self {
        Self { discovery }
    }
}

impl std::fmt::Debug for ServiceDiscoveryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceDiscoveryFilter").finish_non_exhaustive()
    }
}

impl Filter for ServiceDiscoveryFilter {
    fn name(&self) -> &'static str {
        "service_discovery"
    }

    fn phase(&self) -> FilterPhase {
        FilterPhase::Pre
    }

    fn order(&self) -> i32 {
        900
    }

    fn should_apply(&self, ctx: &ApiContext) -> bool {
        ctx.api_definition().is_some()
    }

    fn apply(&self, mut ctx: ApiContext) -> Task<ApiContext> {
        let Some(definition) = ctx.api_definition().cloned() else {
            return Task::failed(GatewayError::illegal_state(
                "service discovery ran before route matching",
            ));
        };

        // Distinct services, first-appearance order.
        let mut services: Vec<String> = Vec::new();
        for endpoint in definition.endpoints() {
            if !services.iter().any(|s| s == endpoint.service()) {
                services.push(endpoint.service().to_string());
            }
        }

        let resolutions: Vec<Task<ServiceInstance>> = services
            .into_iter()
            .map(|service| {
                let resolution = self.discovery.resolve(&service);
                Task::from_future(async move {
                    resolution.await.map_err(|error| {
                        GatewayError::unknown_remote(
                            format!("failed to resolve service '{service}': {error}"),
                            Some(service),
                        )
                    })
                })
            })
            .collect();

        Task::par(resolutions).and_then("record_instances", move |instances| async move {
            for instance in instances {
                ctx.set_variable(
                    format!("{SERVICE_VARIABLE_PREFIX}{}", instance.service()),
                    json!(instance.address()),
                );
            }
            Ok(ctx)
        })
    }
}

/// Factory for [`ServiceDiscoveryFilter`], sharing one discovery
/// collaborator across chains.
pub struct ServiceDiscoveryFilterFactory {
    discovery: Arc<dyn ServiceDiscovery>,
}

impl ServiceDiscoveryFilterFactory {
    /// Creates the factory over a discovery collaborator.
    #[must_use]
    pub fn new(discovery: Arc<dyn ServiceDiscovery>) -> Self {
        Self { discovery }
    }
}

impl FilterFactory for ServiceDiscoveryFilterFactory {
    fn name(&self) -> &'static str {
        "service_discovery"
    }

    fn create(&self, _config: &Value) -> GatewayResult<Arc<dyn Filter>> {
        Ok(Arc::new(ServiceDiscoveryFilter::new(Arc::clone(
            &self.discovery,
        ))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use propylaea_core::{ApiDefinition, ErrorKind, HttpEndpoint, PathPattern};
    use std::collections::HashMap;

    /// Discovery over a fixed table; unlisted services fail.
    struct StaticDiscovery {
        table: HashMap<String, ServiceInstance>,
    }

    impl StaticDiscovery {
        fn new(instances: Vec<ServiceInstance>) -> Arc<Self> {
            Arc::new(Self {
                table: instances
                    .into_iter()
                    .map(|i| (i.service().to_string(), i))
                    .collect(),
            })
        }
    }

    impl ServiceDiscovery for StaticDiscovery {
        fn resolve(&self, service: &str) -> Task<ServiceInstance> {
            match self.table.get(service) {
                Some(instance) => Task::succeeded(instance.clone()),
                None => Task::failed(GatewayError::not_found(format!(
                    "no instances of '{service}'"
                ))),
            }
        }
    }

    fn ctx_with_endpoints(endpoints: Vec<HttpEndpoint>) -> ApiContext {
        let definition = ApiDefinition::new(
            "composite",
            Method::GET,
            PathPattern::literal("/composite"),
            endpoints,
        )
        .unwrap();
        let mut ctx = ApiContext::new(Method::GET, "/composite");
        ctx.set_api_definition(Arc::new(definition)).unwrap();
        ctx
    }

    #[tokio::test]
    async fn test_resolves_all_distinct_services() {
        let discovery = StaticDiscovery::new(vec![
            ServiceInstance::new("user", "10.0.0.1", 8080),
            ServiceInstance::new("device", "10.0.0.2", 8081),
        ]);
        let filter = ServiceDiscoveryFilter::new(discovery);

        let ctx = filter
            .apply(ctx_with_endpoints(vec![
                HttpEndpoint::new("u", "user", Method::GET, "/users"),
                HttpEndpoint::new("d", "device", Method::GET, "/devices"),
                // Same service twice resolves once.
                HttpEndpoint::new("u2", "user", Method::GET, "/users/active"),
            ]))
            .await
            .unwrap();

        assert_eq!(ctx.variable("service.user"), Some(&json!("10.0.0.1:8080")));
        assert_eq!(ctx.variable("service.device"), Some(&json!("10.0.0.2:8081")));
    }

    #[tokio::test]
    async fn test_any_failure_maps_to_unknown_remote() {
        let discovery = StaticDiscovery::new(vec![ServiceInstance::new("user", "10.0.0.1", 8080)]);
        let filter = ServiceDiscoveryFilter::new(discovery);

        let err = filter
            .apply(ctx_with_endpoints(vec![
                HttpEndpoint::new("u", "user", Method::GET, "/users"),
                HttpEndpoint::new("m", "missing", Method::GET, "/missing"),
            ]))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UnknownRemote);
        let GatewayError::UnknownRemote {
            service: Some(service),
            ..
        } = err
        else {
            panic!("expected the failing service name");
        };
        assert_eq!(service, "missing");
    }

    #[tokio::test]
    async fn test_unmatched_context_is_illegal_state() {
        let discovery = StaticDiscovery::new(Vec::new());
        let filter = ServiceDiscoveryFilter::new(discovery);

        let err = filter
            .apply(ApiContext::new(Method::GET, "/composite"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IllegalState);
    }
}
