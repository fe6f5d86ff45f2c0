//! In-memory store implementing every storage trait.
//!
//! Mirrors the PostgreSQL semantics closely enough for tests: partial unique
//! indexes over live rows, soft deletes and recency ordering of tokens.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use super::{CourseStore, StoreError, TokenStore, UserStore};
use crate::models::auth::{DuplicateField, IssuedToken, NewUser, Role, User};
use crate::models::course::{
    Answer, Course, CourseSummary, NewAnswer, NewSolution, Problem, ProblemPatch, Solution,
    Verdict, WhitelistEntry,
};
use crate::uuid::new_token_id;

#[derive(Debug, Default)]
struct Inner {
    users: Vec<User>,
    /// Tokens with their insertion sequence.
    tokens: Vec<(u64, IssuedToken)>,
    token_seq: u64,
    courses: Vec<Course>,
    /// `(course_id, user_id)` owner links.
    owners: Vec<(i64, String)>,
    whitelist: Vec<WhitelistEntry>,
    problems: Vec<Problem>,
    answers: Vec<Answer>,
    solutions: Vec<Solution>,
    next_id: i64,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn active_user(&self, user_id: &str) -> Option<&User> {
        self.users
            .iter()
            .find(|u| u.user_id == user_id && u.is_active())
    }

    fn live_course(&self, course_id: i64) -> Option<&Course> {
        self.courses
            .iter()
            .find(|c| c.id == course_id && c.deleted_at.is_none())
    }

    fn owner_names(&self, course_id: i64) -> Vec<String> {
        self.owners
            .iter()
            .filter(|(cid, _)| *cid == course_id)
            .filter_map(|(_, uid)| self.active_user(uid))
            .map(|u| u.display_name.clone())
            .collect()
    }

    fn live_problem_mut(&mut self, course_id: i64, problem_id: i64) -> Option<&mut Problem> {
        self.problems
            .iter_mut()
            .find(|p| p.id == problem_id && p.course_id == course_id && p.deleted_at.is_none())
    }

    fn live_whitelist_mut(&mut self, course_id: i64, user_id: &str) -> Option<&mut WhitelistEntry> {
        self.whitelist
            .iter_mut()
            .find(|w| w.course_id == course_id && w.user_id == user_id && w.deleted_at.is_none())
    }
}

/// Process-local store guarded by a single async lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_active_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.active_user(user_id).cloned())
    }

    async fn find_conflicts(
        &self,
        user_id: &str,
        display_name: &str,
        external_id: Option<i64>,
    ) -> Result<Vec<DuplicateField>, StoreError> {
        let inner = self.inner.read().await;
        let live = || inner.users.iter().filter(|u| u.is_active());
        let mut fields = Vec::new();
        if live().any(|u| u.user_id == user_id) {
            fields.push(DuplicateField::Id);
        }
        if live().any(|u| u.display_name == display_name) {
            fields.push(DuplicateField::Nickname);
        }
        if external_id.is_some() && live().any(|u| u.external_id == external_id) {
            fields.push(DuplicateField::StudentId);
        }
        Ok(fields)
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        let taken = inner.users.iter().filter(|u| u.is_active()).any(|u| {
            u.user_id == user.user_id
                || u.display_name == user.display_name
                || (user.external_id.is_some() && u.external_id == user.external_id)
        });
        if taken {
            return Err(StoreError::Conflict("users".into()));
        }
        let record = User {
            user_id: user.user_id,
            password_hash: user.password_hash,
            display_name: user.display_name,
            external_id: user.external_id,
            role: Role::Student,
            created_at: Utc::now(),
            deleted_at: None,
        };
        inner.users.push(record.clone());
        Ok(record)
    }

    async fn soft_delete_user(
        &self,
        user_id: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        match inner
            .users
            .iter_mut()
            .find(|u| u.user_id == user_id && u.is_active())
        {
            Some(user) => {
                user.deleted_at = Some(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_role(&self, user_id: &str, role: Role) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        match inner
            .users
            .iter_mut()
            .find(|u| u.user_id == user_id && u.is_active())
        {
            Some(user) => {
                user.role = role;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn save_token(
        &self,
        user_id: &str,
        token_value: &str,
        created_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<IssuedToken, StoreError> {
        let mut inner = self.inner.write().await;
        inner
            .tokens
            .retain(|(_, t)| !(t.user_id == user_id && t.expires_at <= created_at));
        inner.token_seq += 1;
        let seq = inner.token_seq;
        let token = IssuedToken {
            token_id: new_token_id(),
            user_id: user_id.to_string(),
            token_value: token_value.to_string(),
            created_at,
            expires_at: created_at + ttl,
        };
        inner.tokens.push((seq, token.clone()));
        Ok(token)
    }

    async fn latest_token(
        &self,
        user_id: &str,
        valid_at: DateTime<Utc>,
    ) -> Result<Option<IssuedToken>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .tokens
            .iter()
            .filter(|(_, t)| t.user_id == user_id && t.expires_at > valid_at)
            .max_by_key(|(seq, t)| (t.created_at, *seq))
            .map(|(_, t)| t.clone()))
    }

    async fn delete_token(&self, user_id: &str, token_value: &str) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.tokens.len();
        inner
            .tokens
            .retain(|(_, t)| !(t.user_id == user_id && t.token_value == token_value));
        Ok((before - inner.tokens.len()) as u64)
    }

    async fn delete_all_tokens(&self, user_id: &str) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.tokens.len();
        inner.tokens.retain(|(_, t)| t.user_id != user_id);
        Ok((before - inner.tokens.len()) as u64)
    }
}

#[async_trait]
impl CourseStore for MemoryStore {
    async fn create_course(&self, title: &str, owner_id: &str) -> Result<Course, StoreError> {
        let mut inner = self.inner.write().await;
        let course = Course {
            id: inner.next_id(),
            title: title.to_string(),
            created_at: Utc::now(),
            deleted_at: None,
        };
        inner.courses.push(course.clone());
        inner.owners.push((course.id, owner_id.to_string()));
        Ok(course)
    }

    async fn list_courses(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CourseSummary>, StoreError> {
        let inner = self.inner.read().await;
        let mut live: Vec<&Course> = inner
            .courses
            .iter()
            .filter(|c| c.deleted_at.is_none())
            .collect();
        live.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(live
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|c| CourseSummary {
                id: c.id,
                title: c.title.clone(),
                owners: inner.owner_names(c.id),
                problem_count: inner
                    .problems
                    .iter()
                    .filter(|p| p.course_id == c.id && p.deleted_at.is_none())
                    .count() as i64,
                created_at: c.created_at,
            })
            .collect())
    }

    async fn find_course(&self, course_id: i64) -> Result<Option<Course>, StoreError> {
        Ok(self.inner.read().await.live_course(course_id).cloned())
    }

    async fn course_owners(&self, course_id: i64) -> Result<Vec<String>, StoreError> {
        Ok(self.inner.read().await.owner_names(course_id))
    }

    async fn is_owner(&self, course_id: i64, user_id: &str) -> Result<bool, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .owners
            .iter()
            .any(|(cid, uid)| *cid == course_id && uid == user_id))
    }

    async fn update_course_title(
        &self,
        course_id: i64,
        title: &str,
    ) -> Result<Option<Course>, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner
            .courses
            .iter_mut()
            .find(|c| c.id == course_id && c.deleted_at.is_none())
            .map(|c| {
                c.title = title.to_string();
                c.clone()
            }))
    }

    async fn soft_delete_course(
        &self,
        course_id: i64,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        match inner
            .courses
            .iter_mut()
            .find(|c| c.id == course_id && c.deleted_at.is_none())
        {
            Some(course) => {
                course.deleted_at = Some(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_whitelist(&self, course_id: i64) -> Result<Vec<WhitelistEntry>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .whitelist
            .iter()
            .filter(|w| w.course_id == course_id && w.deleted_at.is_none())
            .cloned()
            .collect())
    }

    async fn add_whitelist(
        &self,
        course_id: i64,
        user_id: &str,
    ) -> Result<WhitelistEntry, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.live_whitelist_mut(course_id, user_id).is_some() {
            return Err(StoreError::Conflict("whitelist_entries".into()));
        }
        let entry = WhitelistEntry {
            id: inner.next_id(),
            course_id,
            user_id: user_id.to_string(),
            accepted: false,
            created_at: Utc::now(),
            deleted_at: None,
        };
        inner.whitelist.push(entry.clone());
        Ok(entry)
    }

    async fn remove_whitelist(
        &self,
        course_id: i64,
        user_id: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        match inner.live_whitelist_mut(course_id, user_id) {
            Some(entry) => {
                entry.deleted_at = Some(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn accept_whitelist(&self, course_id: i64, user_id: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        match inner.live_whitelist_mut(course_id, user_id) {
            Some(entry) => {
                entry.accepted = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn is_member(&self, course_id: i64, user_id: &str) -> Result<bool, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.whitelist.iter().any(|w| {
            w.course_id == course_id && w.user_id == user_id && w.accepted && w.deleted_at.is_none()
        }))
    }

    async fn create_problem(
        &self,
        course_id: i64,
        title: &str,
        body: &serde_json::Value,
    ) -> Result<Problem, StoreError> {
        let mut inner = self.inner.write().await;
        let problem = Problem {
            id: inner.next_id(),
            course_id,
            title: title.to_string(),
            body: body.clone(),
            created_at: Utc::now(),
            deleted_at: None,
        };
        inner.problems.push(problem.clone());
        Ok(problem)
    }

    async fn list_problems(&self, course_id: i64) -> Result<Vec<Problem>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .problems
            .iter()
            .filter(|p| p.course_id == course_id && p.deleted_at.is_none())
            .cloned()
            .collect())
    }

    async fn find_problem(
        &self,
        course_id: i64,
        problem_id: i64,
    ) -> Result<Option<Problem>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .problems
            .iter()
            .find(|p| p.id == problem_id && p.course_id == course_id && p.deleted_at.is_none())
            .cloned())
    }

    async fn update_problem(
        &self,
        course_id: i64,
        problem_id: i64,
        patch: &ProblemPatch,
    ) -> Result<Option<Problem>, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner.live_problem_mut(course_id, problem_id).map(|p| {
            if let Some(title) = &patch.title {
                p.title = title.clone();
            }
            if let Some(body) = &patch.body {
                p.body = body.clone();
            }
            p.clone()
        }))
    }

    async fn soft_delete_problem(
        &self,
        course_id: i64,
        problem_id: i64,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        match inner.live_problem_mut(course_id, problem_id) {
            Some(problem) => {
                problem.deleted_at = Some(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn create_answer(
        &self,
        problem_id: i64,
        answer: &NewAnswer,
    ) -> Result<Answer, StoreError> {
        let mut inner = self.inner.write().await;
        let record = Answer {
            id: inner.next_id(),
            problem_id,
            input: answer.input.clone(),
            output: answer.output.clone(),
            hidden: answer.hidden,
        };
        inner.answers.push(record.clone());
        Ok(record)
    }

    async fn list_answers(
        &self,
        problem_id: i64,
        include_hidden: bool,
    ) -> Result<Vec<Answer>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .answers
            .iter()
            .filter(|a| a.problem_id == problem_id && (include_hidden || !a.hidden))
            .cloned()
            .collect())
    }

    async fn create_solution(
        &self,
        problem_id: i64,
        user_id: &str,
        solution: &NewSolution,
    ) -> Result<Solution, StoreError> {
        let mut inner = self.inner.write().await;
        let record = Solution {
            id: inner.next_id(),
            problem_id,
            user_id: user_id.to_string(),
            source: solution.source.clone(),
            language: solution.language.clone(),
            verdict: Verdict::Pending,
            runtime_ms: None,
            memory_kb: None,
            created_at: Utc::now(),
        };
        inner.solutions.push(record.clone());
        Ok(record)
    }

    async fn find_solution(
        &self,
        course_id: i64,
        solution_id: i64,
    ) -> Result<Option<Solution>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .solutions
            .iter()
            .find(|s| {
                s.id == solution_id
                    && inner
                        .problems
                        .iter()
                        .any(|p| p.id == s.problem_id && p.course_id == course_id)
            })
            .cloned())
    }

    async fn list_solutions(
        &self,
        course_id: i64,
        user_id: &str,
    ) -> Result<Vec<Solution>, StoreError> {
        let inner = self.inner.read().await;
        let mut rows: Vec<Solution> = inner
            .solutions
            .iter()
            .filter(|s| {
                s.user_id == user_id
                    && inner
                        .problems
                        .iter()
                        .any(|p| p.id == s.problem_id && p.course_id == course_id)
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }
}
