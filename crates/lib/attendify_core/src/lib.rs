//! # attendify_core
//!
//! Core authentication and authorization logic for Attendify.

pub mod auth;
pub mod cache;
pub mod migrate;
pub mod models;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
