//! Built-in filters.
//!
//! PRE phase: [`ApiMatchFilter`] resolves the route first, then
//! [`IpRestrictionFilter`] and [`RateLimitFilter`] guard admission, then
//! [`ServiceDiscoveryFilter`] resolves backend addresses. POST phase:
//! [`ResponseTransformerFilter`] shapes the result headers.
//!
//! Each filter ships a [`FilterFactory`](crate::FilterFactory) so a chain
//! can be assembled from configuration through a
//! [`FilterRegistry`](crate::FilterRegistry).

mod api_match;
mod ip_restriction;
mod rate_limit;
mod response_transformer;
mod service_discovery;

pub use api_match::{ApiMatchFilter, ApiMatchFilterFactory};
pub use ip_restriction::{IpRestrictionFilter, IpRestrictionFilterFactory};
pub use rate_limit::{RateLimitFilter, RateLimitFilterFactory, REMAINING_VARIABLE};
pub use response_transformer::{ResponseTransformerFilter, ResponseTransformerFilterFactory};
pub use service_discovery::{
    ServiceDiscovery, ServiceDiscoveryFilter, ServiceDiscoveryFilterFactory, ServiceInstance,
    SERVICE_VARIABLE_PREFIX,
};
