//! # Propylaea Router
//!
//! Route registry and precedence matcher for the Propylaea gateway.
//!
//! The router owns the published [`ApiDefinition`] set and resolves each
//! incoming (method, path) pair to exactly one definition:
//!
//! - [`ApiRegistry`] - Atomic snapshot-swapped registry of definitions
//! - [`RegistrySnapshot`] - Immutable, method-partitioned candidate view
//! - [`match_route`] - Exact > regex > ant precedence matching
//!
//! [`ApiDefinition`]: propylaea_core::ApiDefinition

#![doc(html_root_url = "https://docs.rs/propylaea-router/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod matcher;
mod pattern;
mod registry;

pub use matcher::match_route;
pub use pattern::{ant_matches, matches};
pub use registry::{ApiRegistry, RegistrySnapshot};
