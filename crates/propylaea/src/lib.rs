//! # Propylaea
//!
//! **API gateway core built around an asynchronous filter-chain dispatch
//! engine.**
//!
//! Propylaea resolves each inbound request to exactly one published API
//! definition, runs it through ordered PRE and POST filter chains, and
//! writes a JSON response or a `{code, message}` error envelope. It does
//! not own a listener: whatever HTTP server fronts it adapts its request
//! type to [`InboundRequest`](gateway::InboundRequest) and writes the
//! returned [`OutboundResponse`](gateway::OutboundResponse).
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use propylaea::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_logging(&LogConfig::default())?;
//!
//!     let registry = Arc::new(ApiRegistry::new());
//!     registry.publish(ApiDefinition::new(
//!         "list_devices",
//!         http::Method::GET,
//!         PathPattern::literal("/devices"),
//!         vec![HttpEndpoint::new("main", "device", http::Method::GET, "/devices")],
//!     )?)?;
//!
//!     let chain = FilterChain::builder()
//!         .filter(Arc::new(ApiMatchFilter::new(Arc::clone(&registry))))
//!         .build();
//!     let handler = DispatchHandler::new(Arc::new(chain), my_invoker());
//!
//!     let response = handler
//!         .dispatch(InboundRequest::new(http::Method::GET, "/devices"))
//!         .await;
//!     println!("{}", response.status());
//!     Ok(())
//! }
//! ```
//!
//! ## Request flow
//!
//! ```text
//! Request → ApiMatch → IpRestriction → RateLimit → ServiceDiscovery → Backend
//!                                                                       ↓
//! Response ← envelope-on-failure ← ResponseTransformer ←───────────────┘
//! ```

#![doc(html_root_url = "https://docs.rs/propylaea/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use propylaea_core as core;

// Re-export router types
pub use propylaea_router as router;

// Re-export pipeline types
pub use propylaea_pipeline as pipeline;

// Re-export gateway types
pub use propylaea_gateway as gateway;

// Re-export configuration types
pub use propylaea_config as config;

// Re-export telemetry types
pub use propylaea_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use propylaea::prelude::*;
/// ```
pub mod prelude {
    pub use propylaea_core::{
        ApiContext, ApiDefinition, ApiPlugin, ApiResult, ErrorEnvelope, ErrorKind, GatewayError,
        GatewayResult, HttpEndpoint, PathPattern, PluginCodec, PluginCodecRegistry, RequestId,
        ResultBody, Task, TaskCompleter,
    };

    pub use propylaea_router::ApiRegistry;

    pub use propylaea_pipeline::{
        Filter, FilterChain, FilterFactory, FilterPhase, FilterRegistry,
    };

    pub use propylaea_pipeline::filters::{
        ApiMatchFilter, IpRestrictionFilter, RateLimitFilter, ResponseTransformerFilter,
        ServiceDiscovery, ServiceDiscoveryFilter, ServiceInstance,
    };

    pub use propylaea_pipeline::plugins::{
        IpRestrictionCodec, IpRestrictionPlugin, RateLimitCodec, RateLimitPlugin,
    };

    pub use propylaea_gateway::{
        BackendInvoker, DispatchHandler, InboundRequest, OutboundResponse,
    };

    pub use propylaea_config::{ConfigLoader, GatewayConfig};

    pub use propylaea_telemetry::{init_logging, LogConfig};
}
