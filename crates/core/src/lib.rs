//! Core library for the kiln buildpack builder
//!
//! This crate contains shared logic for the build phase model, container
//! configuration, lifecycle execution, the Docker Engine API transport,
//! build configuration resolution, logging, and error handling.

pub mod binding;
pub mod cache;
pub mod config;
pub mod container_config;
pub mod docker;
pub mod errors;
pub mod lifecycle;
pub mod logging;
pub mod phase;

// Re-export IndexMap for use by dependent crates (preserves insertion order for ordered maps)
pub use indexmap::IndexMap;

/// Get the version of the core library
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
