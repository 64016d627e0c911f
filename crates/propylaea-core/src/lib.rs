//! # Propylaea Core
//!
//! Core types and the async task combinator for the Propylaea gateway.
//!
//! This crate provides the foundational pieces the rest of the workspace
//! composes over:
//!
//! - [`ApiContext`] - Per-request mutable state threaded through the pipeline
//! - [`RequestId`] - UUID v7 request identifier
//! - [`ApiResult`] - Immutable response representation
//! - [`ApiDefinition`] - A registered route with endpoints, filters, plugins
//! - [`ApiPlugin`] / [`PluginCodecRegistry`] - Polymorphic definition plugins
//! - [`Task`] - Sequential/parallel async composition with fail-fast semantics
//! - [`GatewayError`] - Standard error taxonomy with wire-code mapping

#![doc(html_root_url = "https://docs.rs/propylaea-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod definition;
mod error;
mod plugin;
mod result;
mod task;

pub use context::{ApiContext, RequestId, RESPONSE_HEADER_PREFIX};
pub use definition::{
    AntPattern, AntSegment, ApiDefinition, DefinitionCodec, HttpEndpoint, PathPattern,
    RegexPattern,
};
pub use error::{ErrorEnvelope, ErrorKind, GatewayError, GatewayResult};
pub use plugin::{ApiPlugin, PluginCodec, PluginCodecRegistry};
pub use result::{ApiResult, ResultBody};
pub use task::{Task, TaskCompleter};
