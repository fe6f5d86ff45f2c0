//! Request handlers.

pub mod admin;
pub mod auth;
pub mod courses;
pub mod health;
pub mod problems;
pub mod solutions;
pub mod whitelist;
