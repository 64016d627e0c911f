//! # Propylaea Pipeline
//!
//! Filter contract, chain builder and built-in filters for the Propylaea
//! gateway.
//!
//! A request's lifecycle is a sequence of filters folded into a single
//! [`Task`](propylaea_core::Task): the PRE chain guards and enriches the
//! request before the backend result exists, the POST chain shapes the
//! result before it is written. A failed filter aborts the rest of its
//! chain and surfaces through the dispatch handler's error envelope.
//!
//! - [`Filter`] / [`FilterFactory`] / [`FilterRegistry`] - The contract
//! - [`FilterChain`] - Phase-partitioned, order-sorted, shared per process
//! - [`filters`] - Built-in filters (route match, admission, discovery,
//!   response shaping)
//! - [`plugins`] - The definition plugins driving the admission filters

#![doc(html_root_url = "https://docs.rs/propylaea-pipeline/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod chain;
mod filter;
pub mod filters;
pub mod plugins;

pub use chain::{ChainObserver, FilterChain, FilterChainBuilder};
pub use filter::{Filter, FilterFactory, FilterPhase, FilterRegistry};
