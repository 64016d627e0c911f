//! Concrete plugins shipped with the gateway.
//!
//! Each plugin pairs a configuration object attached to an
//! [`ApiDefinition`](propylaea_core::ApiDefinition) with the codec that
//! round-trips it through JSON. The filters in [`crate::filters`] read
//! these plugins off the matched definition.

mod ip_restriction;
mod rate_limit;

pub use ip_restriction::{IpRestrictionCodec, IpRestrictionPlugin, IP_RESTRICTION_KIND};
pub use rate_limit::{RateLimitCodec, RateLimitPlugin, RATE_LIMIT_KIND};
