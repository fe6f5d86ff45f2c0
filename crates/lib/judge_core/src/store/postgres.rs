//! PostgreSQL-backed store.
//!
//! Thin adapter over the query functions in `auth::queries` and
//! `courses::queries`.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

use super::{CourseStore, StoreError, TokenStore, UserStore};
use crate::auth::queries as auth_q;
use crate::courses::queries as course_q;
use crate::models::auth::{DuplicateField, IssuedToken, NewUser, Role, User};
use crate::models::course::{
    Answer, Course, CourseSummary, NewAnswer, NewSolution, Problem, ProblemPatch, Solution,
    WhitelistEntry,
};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_active_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        auth_q::find_active_user(&self.pool, user_id).await
    }

    async fn find_conflicts(
        &self,
        user_id: &str,
        display_name: &str,
        external_id: Option<i64>,
    ) -> Result<Vec<DuplicateField>, StoreError> {
        auth_q::find_conflicts(&self.pool, user_id, display_name, external_id).await
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        auth_q::create_user(&self.pool, user).await
    }

    async fn soft_delete_user(
        &self,
        user_id: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        auth_q::soft_delete_user(&self.pool, user_id, at).await
    }

    async fn set_role(&self, user_id: &str, role: Role) -> Result<bool, StoreError> {
        auth_q::set_role(&self.pool, user_id, role).await
    }
}

#[async_trait]
impl TokenStore for PgStore {
    async fn save_token(
        &self,
        user_id: &str,
        token_value: &str,
        created_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<IssuedToken, StoreError> {
        auth_q::save_token(&self.pool, user_id, token_value, created_at, ttl).await
    }

    async fn latest_token(
        &self,
        user_id: &str,
        valid_at: DateTime<Utc>,
    ) -> Result<Option<IssuedToken>, StoreError> {
        auth_q::latest_token(&self.pool, user_id, valid_at).await
    }

    async fn delete_token(&self, user_id: &str, token_value: &str) -> Result<u64, StoreError> {
        auth_q::delete_token(&self.pool, user_id, token_value).await
    }

    async fn delete_all_tokens(&self, user_id: &str) -> Result<u64, StoreError> {
        auth_q::delete_all_tokens(&self.pool, user_id).await
    }
}

#[async_trait]
impl CourseStore for PgStore {
    async fn create_course(&self, title: &str, owner_id: &str) -> Result<Course, StoreError> {
        course_q::create_course(&self.pool, title, owner_id).await
    }

    async fn list_courses(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CourseSummary>, StoreError> {
        course_q::list_courses(&self.pool, limit, offset).await
    }

    async fn find_course(&self, course_id: i64) -> Result<Option<Course>, StoreError> {
        course_q::find_course(&self.pool, course_id).await
    }

    async fn course_owners(&self, course_id: i64) -> Result<Vec<String>, StoreError> {
        course_q::course_owners(&self.pool, course_id).await
    }

    async fn is_owner(&self, course_id: i64, user_id: &str) -> Result<bool, StoreError> {
        course_q::is_owner(&self.pool, course_id, user_id).await
    }

    async fn update_course_title(
        &self,
        course_id: i64,
        title: &str,
    ) -> Result<Option<Course>, StoreError> {
        course_q::update_course_title(&self.pool, course_id, title).await
    }

    async fn soft_delete_course(
        &self,
        course_id: i64,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        course_q::soft_delete_course(&self.pool, course_id, at).await
    }

    async fn list_whitelist(&self, course_id: i64) -> Result<Vec<WhitelistEntry>, StoreError> {
        course_q::list_whitelist(&self.pool, course_id).await
    }

    async fn add_whitelist(
        &self,
        course_id: i64,
        user_id: &str,
    ) -> Result<WhitelistEntry, StoreError> {
        course_q::add_whitelist(&self.pool, course_id, user_id).await
    }

    async fn remove_whitelist(
        &self,
        course_id: i64,
        user_id: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        course_q::remove_whitelist(&self.pool, course_id, user_id, at).await
    }

    async fn accept_whitelist(&self, course_id: i64, user_id: &str) -> Result<bool, StoreError> {
        course_q::accept_whitelist(&self.pool, course_id, user_id).await
    }

    async fn is_member(&self, course_id: i64, user_id: &str) -> Result<bool, StoreError> {
        course_q::is_member(&self.pool, course_id, user_id).await
    }

    async fn create_problem(
        &self,
        course_id: i64,
        title: &str,
        body: &serde_json::Value,
    ) -> Result<Problem, StoreError> {
        course_q::create_problem(&self.pool, course_id, title, body).await
    }

    async fn list_problems(&self, course_id: i64) -> Result<Vec<Problem>, StoreError> {
        course_q::list_problems(&self.pool, course_id).await
    }

    async fn find_problem(
        &self,
        course_id: i64,
        problem_id: i64,
    ) -> Result<Option<Problem>, StoreError> {
        course_q::find_problem(&self.pool, course_id, problem_id).await
    }

    async fn update_problem(
        &self,
        course_id: i64,
        problem_id: i64,
        patch: &ProblemPatch,
    ) -> Result<Option<Problem>, StoreError> {
        course_q::update_problem(&self.pool, course_id, problem_id, patch).await
    }

    async fn soft_delete_problem(
        &self,
        course_id: i64,
        problem_id: i64,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        course_q::soft_delete_problem(&self.pool, course_id, problem_id, at).await
    }

    async fn create_answer(
        &self,
        problem_id: i64,
        answer: &NewAnswer,
    ) -> Result<Answer, StoreError> {
        course_q::create_answer(&self.pool, problem_id, answer).await
    }

    async fn list_answers(
        &self,
        problem_id: i64,
        include_hidden: bool,
    ) -> Result<Vec<Answer>, StoreError> {
        course_q::list_answers(&self.pool, problem_id, include_hidden).await
    }

    async fn create_solution(
        &self,
        problem_id: i64,
        user_id: &str,
        solution: &NewSolution,
    ) -> Result<Solution, StoreError> {
        course_q::create_solution(&self.pool, problem_id, user_id, solution).await
    }

    async fn find_solution(
        &self,
        course_id: i64,
        solution_id: i64,
    ) -> Result<Option<Solution>, StoreError> {
        course_q::find_solution(&self.pool, course_id, solution_id).await
    }

    async fn list_solutions(
        &self,
        course_id: i64,
        user_id: &str,
    ) -> Result<Vec<Solution>, StoreError> {
        course_q::list_solutions(&self.pool, course_id, user_id).await
    }
}
