//! Domain models shared by the stores, services and the HTTP layer.

pub mod auth;
pub mod course;
