//! Course domain: courses, whitelist membership, problems, answers and
//! solutions.
//!
//! Every operation receives the already-verified `Principal`; role checks
//! happen in the HTTP guard, ownership and membership checks happen here.

pub mod queries;
pub mod service;

use thiserror::Error;

use crate::store::StoreError;

pub use service::{CourseService, EntryResult};

#[derive(Debug, Error)]
pub enum CourseError {
    #[error("Course not found")]
    CourseNotFound,

    #[error("Problem not found")]
    ProblemNotFound,

    #[error("Solution not found")]
    SolutionNotFound,

    #[error("Not an owner of this course")]
    NotOwner,

    #[error("Not whitelisted for this course")]
    NotWhitelisted,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
