//! Storage seams for users, issued tokens and the course domain.
//!
//! Services depend on these traits only. `PgStore` is the production
//! implementation; `MemoryStore` backs tests and `--memory-store` runs.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::models::auth::{DuplicateField, IssuedToken, NewUser, Role, User};
use crate::models::course::{
    Answer, Course, CourseSummary, NewAnswer, NewSolution, Problem, ProblemPatch, Solution,
    WhitelistEntry,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Map unique-violation database errors onto `Conflict`.
    pub(crate) fn from_insert(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(db.constraint().unwrap_or("unique").to_string())
            }
            _ => StoreError::Db(e),
        }
    }
}

/// User records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fetch a user that has not been withdrawn.
    async fn find_active_user(&self, user_id: &str) -> Result<Option<User>, StoreError>;

    /// Report every unique field already taken by some active user.
    ///
    /// Each field is checked on its own, so different users owning different
    /// fields are all reported. Order: id, nickname, studentId.
    async fn find_conflicts(
        &self,
        user_id: &str,
        display_name: &str,
        external_id: Option<i64>,
    ) -> Result<Vec<DuplicateField>, StoreError>;

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;

    /// Set `deleted_at`. Returns false when no active user matched.
    async fn soft_delete_user(&self, user_id: &str, at: DateTime<Utc>)
    -> Result<bool, StoreError>;

    /// Returns false when no active user matched.
    async fn set_role(&self, user_id: &str, role: Role) -> Result<bool, StoreError>;
}

/// Issued session tokens.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Persist a token with `expires_at = created_at + ttl`. Rows of the
    /// same user already expired at `created_at` are removed.
    async fn save_token(
        &self,
        user_id: &str,
        token_value: &str,
        created_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<IssuedToken, StoreError>;

    /// Most recently issued token of the user still valid at `valid_at`
    /// (`expires_at > valid_at`).
    async fn latest_token(
        &self,
        user_id: &str,
        valid_at: DateTime<Utc>,
    ) -> Result<Option<IssuedToken>, StoreError>;

    /// Delete the exact `(user_id, token_value)` rows. Returns the count.
    async fn delete_token(&self, user_id: &str, token_value: &str) -> Result<u64, StoreError>;

    /// Delete every token of the user. Returns the count.
    async fn delete_all_tokens(&self, user_id: &str) -> Result<u64, StoreError>;
}

/// Courses, whitelist, problems, answers and solutions.
#[async_trait]
pub trait CourseStore: Send + Sync {
    /// Create a course and its owner link atomically.
    async fn create_course(&self, title: &str, owner_id: &str) -> Result<Course, StoreError>;
    /// Live courses, newest first.
    async fn list_courses(&self, limit: i64, offset: i64)
    -> Result<Vec<CourseSummary>, StoreError>;
    async fn find_course(&self, course_id: i64) -> Result<Option<Course>, StoreError>;
    /// Display names of the active owners.
    async fn course_owners(&self, course_id: i64) -> Result<Vec<String>, StoreError>;
    async fn is_owner(&self, course_id: i64, user_id: &str) -> Result<bool, StoreError>;
    async fn update_course_title(
        &self,
        course_id: i64,
        title: &str,
    ) -> Result<Option<Course>, StoreError>;
    async fn soft_delete_course(&self, course_id: i64, at: DateTime<Utc>)
    -> Result<bool, StoreError>;

    async fn list_whitelist(&self, course_id: i64) -> Result<Vec<WhitelistEntry>, StoreError>;
    /// Conflict when a live entry already exists for the user.
    async fn add_whitelist(
        &self,
        course_id: i64,
        user_id: &str,
    ) -> Result<WhitelistEntry, StoreError>;
    async fn remove_whitelist(
        &self,
        course_id: i64,
        user_id: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
    /// Mark the live entry accepted. Returns false when none exists.
    async fn accept_whitelist(&self, course_id: i64, user_id: &str) -> Result<bool, StoreError>;
    /// Live and accepted entry exists.
    async fn is_member(&self, course_id: i64, user_id: &str) -> Result<bool, StoreError>;

    async fn create_problem(
        &self,
        course_id: i64,
        title: &str,
        body: &serde_json::Value,
    ) -> Result<Problem, StoreError>;
    async fn list_problems(&self, course_id: i64) -> Result<Vec<Problem>, StoreError>;
    async fn find_problem(
        &self,
        course_id: i64,
        problem_id: i64,
    ) -> Result<Option<Problem>, StoreError>;
    async fn update_problem(
        &self,
        course_id: i64,
        problem_id: i64,
        patch: &ProblemPatch,
    ) -> Result<Option<Problem>, StoreError>;
    async fn soft_delete_problem(
        &self,
        course_id: i64,
        problem_id: i64,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    async fn create_answer(&self, problem_id: i64, answer: &NewAnswer)
    -> Result<Answer, StoreError>;
    async fn list_answers(
        &self,
        problem_id: i64,
        include_hidden: bool,
    ) -> Result<Vec<Answer>, StoreError>;

    async fn create_solution(
        &self,
        problem_id: i64,
        user_id: &str,
        solution: &NewSolution,
    ) -> Result<Solution, StoreError>;
    /// Solution whose problem belongs to the course.
    async fn find_solution(
        &self,
        course_id: i64,
        solution_id: i64,
    ) -> Result<Option<Solution>, StoreError>;
    /// Submissions of the user in the course, newest first.
    async fn list_solutions(
        &self,
        course_id: i64,
        user_id: &str,
    ) -> Result<Vec<Solution>, StoreError>;
}
