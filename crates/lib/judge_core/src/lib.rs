//! # judge_core
//!
//! Core domain logic for Judge: authentication, course management and the
//! stores both run on.

pub mod auth;
pub mod courses;
pub mod migrate;
pub mod models;
pub mod store;
pub mod uuid;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
