//! # Propylaea Gateway
//!
//! Request dispatch orchestration for the Propylaea gateway.
//!
//! This crate owns the HTTP boundary contract and the dispatch handler
//! that drives the filter chains:
//!
//! - [`InboundRequest`] / [`OutboundResponse`] - Server-agnostic request
//!   and response shapes
//! - [`DispatchHandler`] - PRE chain, backend invocation, POST chain,
//!   response writing, error envelope
//! - [`BackendInvoker`] - The seam where an HTTP client plugs in

#![doc(html_root_url = "https://docs.rs/propylaea-gateway/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod dispatch;
mod request;

pub use dispatch::{BackendInvoker, DispatchHandler, REQUEST_ID_HEADER};
pub use request::{InboundRequest, OutboundResponse};
