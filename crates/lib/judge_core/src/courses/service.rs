//! Course service: authorization by ownership and membership on top of
//! `CourseStore`.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use super::CourseError;
use crate::models::auth::{Principal, Role};
use crate::models::course::{
    Answer, Course, CourseDetail, CourseSummary, NewAnswer, NewSolution, Problem, ProblemDetail,
    ProblemPatch, Solution, WhitelistEntry,
};
use crate::store::{CourseStore, StoreError, UserStore};

/// Default page size of the course listing.
pub const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

/// Outcome of one item of a batch operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> EntryResult<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// How the caller relates to a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Owner,
    Member,
}

#[derive(Clone)]
pub struct CourseService {
    courses: Arc<dyn CourseStore>,
    users: Arc<dyn UserStore>,
}

impl CourseService {
    pub fn new(courses: Arc<dyn CourseStore>, users: Arc<dyn UserStore>) -> Self {
        Self { courses, users }
    }

    // --- courses ---

    pub async fn create_course(
        &self,
        principal: &Principal,
        title: &str,
    ) -> Result<Course, CourseError> {
        let title = non_empty("title", title)?;
        let course = self.courses.create_course(title, &principal.user_id).await?;
        info!(course_id = course.id, owner = %principal.user_id, "course created");
        Ok(course)
    }

    pub async fn list_courses(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<CourseSummary>, CourseError> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = offset.unwrap_or(0).max(0);
        Ok(self.courses.list_courses(limit, offset).await?)
    }

    pub async fn get_course(&self, course_id: i64) -> Result<CourseDetail, CourseError> {
        let course = self.require_course(course_id).await?;
        let owners = self.courses.course_owners(course_id).await?;
        let problems = self.courses.list_problems(course_id).await?;
        Ok(CourseDetail {
            course,
            owners,
            problems,
        })
    }

    pub async fn update_course(
        &self,
        principal: &Principal,
        course_id: i64,
        title: &str,
    ) -> Result<Course, CourseError> {
        let title = non_empty("title", title)?;
        self.ensure_owner(principal, course_id).await?;
        self.courses
            .update_course_title(course_id, title)
            .await?
            .ok_or(CourseError::CourseNotFound)
    }

    pub async fn delete_course(
        &self,
        principal: &Principal,
        course_id: i64,
    ) -> Result<(), CourseError> {
        self.ensure_owner(principal, course_id).await?;
        if !self.courses.soft_delete_course(course_id, Utc::now()).await? {
            return Err(CourseError::CourseNotFound);
        }
        info!(course_id, by = %principal.user_id, "course deleted");
        Ok(())
    }

    // --- whitelist ---

    pub async fn list_whitelist(
        &self,
        principal: &Principal,
        course_id: i64,
    ) -> Result<Vec<WhitelistEntry>, CourseError> {
        self.ensure_owner(principal, course_id).await?;
        Ok(self.courses.list_whitelist(course_id).await?)
    }

    /// Create pending entries. Unknown or already listed users fail
    /// individually without aborting the batch.
    pub async fn add_whitelist(
        &self,
        principal: &Principal,
        course_id: i64,
        user_ids: &[String],
    ) -> Result<Vec<EntryResult<WhitelistEntry>>, CourseError> {
        self.ensure_owner(principal, course_id).await?;

        let mut results = Vec::with_capacity(user_ids.len());
        for user_id in user_ids {
            if self.users.find_active_user(user_id).await?.is_none() {
                results.push(EntryResult::failed(format!("User not found: {user_id}")));
                continue;
            }
            match self.courses.add_whitelist(course_id, user_id).await {
                Ok(entry) => results.push(EntryResult::ok(entry)),
                Err(StoreError::Conflict(_)) => {
                    results.push(EntryResult::failed(format!("Already whitelisted: {user_id}")))
                }
                Err(e) => return Err(e.into()),
            }
        }
        debug!(
            course_id,
            requested = user_ids.len(),
            added = results.iter().filter(|r| r.success).count(),
            "whitelist updated"
        );
        Ok(results)
    }

    pub async fn remove_whitelist(
        &self,
        principal: &Principal,
        course_id: i64,
        user_ids: &[String],
    ) -> Result<Vec<EntryResult<String>>, CourseError> {
        self.ensure_owner(principal, course_id).await?;

        let now = Utc::now();
        let mut results = Vec::with_capacity(user_ids.len());
        for user_id in user_ids {
            if self.courses.remove_whitelist(course_id, user_id, now).await? {
                results.push(EntryResult::ok(user_id.clone()));
            } else {
                results.push(EntryResult::failed(format!("Not whitelisted: {user_id}")));
            }
        }
        Ok(results)
    }

    /// Accept the caller's pending whitelist entry.
    pub async fn join(&self, principal: &Principal, course_id: i64) -> Result<(), CourseError> {
        self.require_course(course_id).await?;
        if !self
            .courses
            .accept_whitelist(course_id, &principal.user_id)
            .await?
        {
            return Err(CourseError::NotWhitelisted);
        }
        info!(course_id, user_id = %principal.user_id, "joined course");
        Ok(())
    }

    // --- problems ---

    pub async fn create_problem(
        &self,
        principal: &Principal,
        course_id: i64,
        title: &str,
        body: &serde_json::Value,
    ) -> Result<Problem, CourseError> {
        let title = non_empty("title", title)?;
        self.ensure_owner(principal, course_id).await?;
        let problem = self.courses.create_problem(course_id, title, body).await?;
        info!(course_id, problem_id = problem.id, "problem created");
        Ok(problem)
    }

    pub async fn list_problems(
        &self,
        principal: &Principal,
        course_id: i64,
    ) -> Result<Vec<Problem>, CourseError> {
        self.access(principal, course_id).await?;
        Ok(self.courses.list_problems(course_id).await?)
    }

    /// Problem with its test cases. Members only see visible cases.
    pub async fn get_problem(
        &self,
        principal: &Principal,
        course_id: i64,
        problem_id: i64,
    ) -> Result<ProblemDetail, CourseError> {
        let access = self.access(principal, course_id).await?;
        let problem = self.require_problem(course_id, problem_id).await?;
        let answers = self
            .courses
            .list_answers(problem_id, access == Access::Owner)
            .await?;
        Ok(ProblemDetail { problem, answers })
    }

    pub async fn update_problem(
        &self,
        principal: &Principal,
        course_id: i64,
        problem_id: i64,
        patch: &ProblemPatch,
    ) -> Result<Problem, CourseError> {
        if let Some(title) = &patch.title {
            non_empty("title", title)?;
        }
        self.ensure_owner(principal, course_id).await?;
        self.courses
            .update_problem(course_id, problem_id, patch)
            .await?
            .ok_or(CourseError::ProblemNotFound)
    }

    pub async fn delete_problem(
        &self,
        principal: &Principal,
        course_id: i64,
        problem_id: i64,
    ) -> Result<(), CourseError> {
        self.ensure_owner(principal, course_id).await?;
        if !self
            .courses
            .soft_delete_problem(course_id, problem_id, Utc::now())
            .await?
        {
            return Err(CourseError::ProblemNotFound);
        }
        info!(course_id, problem_id, "problem deleted");
        Ok(())
    }

    // --- answers ---

    /// Add test cases. Each case is validated and stored on its own.
    pub async fn add_answers(
        &self,
        principal: &Principal,
        course_id: i64,
        problem_id: i64,
        answers: &[NewAnswer],
    ) -> Result<Vec<EntryResult<Answer>>, CourseError> {
        self.ensure_owner(principal, course_id).await?;
        self.require_problem(course_id, problem_id).await?;

        let mut results = Vec::with_capacity(answers.len());
        for answer in answers {
            if answer.output.is_empty() {
                results.push(EntryResult::failed("output must not be empty"));
                continue;
            }
            let stored = self.courses.create_answer(problem_id, answer).await?;
            results.push(EntryResult::ok(stored));
        }
        Ok(results)
    }

    // --- solutions ---

    pub async fn submit_solution(
        &self,
        principal: &Principal,
        course_id: i64,
        problem_id: i64,
        solution: &NewSolution,
    ) -> Result<Solution, CourseError> {
        non_empty("source", &solution.source)?;
        non_empty("language", &solution.language)?;
        self.access(principal, course_id).await?;
        self.require_problem(course_id, problem_id).await?;

        let stored = self
            .courses
            .create_solution(problem_id, &principal.user_id, solution)
            .await?;
        info!(
            course_id,
            problem_id,
            solution_id = stored.id,
            user_id = %principal.user_id,
            "solution submitted"
        );
        Ok(stored)
    }

    /// Visible to the submitter and to course owners.
    pub async fn get_solution(
        &self,
        principal: &Principal,
        course_id: i64,
        solution_id: i64,
    ) -> Result<Solution, CourseError> {
        self.require_course(course_id).await?;
        let solution = self
            .courses
            .find_solution(course_id, solution_id)
            .await?
            .ok_or(CourseError::SolutionNotFound)?;
        if solution.user_id != principal.user_id && !self.owns(principal, course_id).await? {
            return Err(CourseError::SolutionNotFound);
        }
        Ok(solution)
    }

    /// The caller's own submissions in the course.
    pub async fn list_solutions(
        &self,
        principal: &Principal,
        course_id: i64,
    ) -> Result<Vec<Solution>, CourseError> {
        self.require_course(course_id).await?;
        Ok(self
            .courses
            .list_solutions(course_id, &principal.user_id)
            .await?)
    }

    // --- helpers ---

    async fn require_course(&self, course_id: i64) -> Result<Course, CourseError> {
        self.courses
            .find_course(course_id)
            .await?
            .ok_or(CourseError::CourseNotFound)
    }

    async fn require_problem(&self, course_id: i64, problem_id: i64) -> Result<Problem, CourseError> {
        self.courses
            .find_problem(course_id, problem_id)
            .await?
            .ok_or(CourseError::ProblemNotFound)
    }

    async fn owns(&self, principal: &Principal, course_id: i64) -> Result<bool, CourseError> {
        if principal.role == Role::Admin {
            return Ok(true);
        }
        Ok(self.courses.is_owner(course_id, &principal.user_id).await?)
    }

    async fn ensure_owner(&self, principal: &Principal, course_id: i64) -> Result<(), CourseError> {
        self.require_course(course_id).await?;
        if !self.owns(principal, course_id).await? {
            return Err(CourseError::NotOwner);
        }
        Ok(())
    }

    async fn access(&self, principal: &Principal, course_id: i64) -> Result<Access, CourseError> {
        self.require_course(course_id).await?;
        if self.owns(principal, course_id).await? {
            return Ok(Access::Owner);
        }
        if self.courses.is_member(course_id, &principal.user_id).await? {
            return Ok(Access::Member);
        }
        Err(CourseError::NotWhitelisted)
    }
}

fn non_empty<'a>(field: &str, value: &'a str) -> Result<&'a str, CourseError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CourseError::Validation(format!("{field} must not be empty")));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::auth::NewUser;
    use crate::models::course::Verdict;
    use crate::store::MemoryStore;

    fn principal(user_id: &str, role: Role) -> Principal {
        Principal {
            user_id: user_id.into(),
            role,
        }
    }

    async fn setup() -> (CourseService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        for (i, id) in ["prof", "other_prof", "stu", "stu2"].iter().enumerate() {
            store
                .create_user(NewUser {
                    user_id: id.to_string(),
                    password_hash: "x".into(),
                    display_name: id.to_uppercase(),
                    external_id: Some(i as i64),
                })
                .await
                .unwrap();
        }
        (CourseService::new(store.clone(), store.clone()), store)
    }

    fn prof() -> Principal {
        principal("prof", Role::Professor)
    }

    fn stu() -> Principal {
        principal("stu", Role::Student)
    }

    #[tokio::test]
    async fn creator_owns_the_course() {
        let (svc, _) = setup().await;
        let course = svc.create_course(&prof(), "Algorithms").await.unwrap();
        let detail = svc.get_course(course.id).await.unwrap();
        assert_eq!(detail.owners, vec!["PROF".to_string()]);
        assert!(detail.problems.is_empty());

        let other = principal("other_prof", Role::Professor);
        assert!(matches!(
            svc.update_course(&other, course.id, "Mine").await,
            Err(CourseError::NotOwner)
        ));
        let admin = principal("root", Role::Admin);
        let renamed = svc.update_course(&admin, course.id, "Renamed").await.unwrap();
        assert_eq!(renamed.title, "Renamed");
    }

    #[tokio::test]
    async fn blank_title_is_rejected() {
        let (svc, _) = setup().await;
        assert!(matches!(
            svc.create_course(&prof(), "  ").await,
            Err(CourseError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn listing_pages_and_counts_problems() {
        let (svc, _) = setup().await;
        let a = svc.create_course(&prof(), "A").await.unwrap();
        svc.create_course(&prof(), "B").await.unwrap();
        svc.create_problem(&prof(), a.id, "P1", &json!({})).await.unwrap();

        let all = svc.list_courses(None, None).await.unwrap();
        assert_eq!(all.len(), 2);
        let a_row = all.iter().find(|c| c.id == a.id).unwrap();
        assert_eq!(a_row.problem_count, 1);

        assert_eq!(svc.list_courses(Some(1), None).await.unwrap().len(), 1);
        assert!(svc.list_courses(None, Some(5)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleted_course_disappears() {
        let (svc, _) = setup().await;
        let course = svc.create_course(&prof(), "Gone").await.unwrap();
        svc.delete_course(&prof(), course.id).await.unwrap();
        assert!(matches!(
            svc.get_course(course.id).await,
            Err(CourseError::CourseNotFound)
        ));
        assert!(svc.list_courses(None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn whitelist_batch_reports_each_entry() {
        let (svc, _) = setup().await;
        let course = svc.create_course(&prof(), "C").await.unwrap();
        let ids = vec!["stu".to_string(), "ghost".to_string(), "stu".to_string()];
        let results = svc.add_whitelist(&prof(), course.id, &ids).await.unwrap();
        assert_eq!(
            results.iter().map(|r| r.success).collect::<Vec<_>>(),
            vec![true, false, false]
        );
        assert_eq!(results[1].error.as_deref(), Some("User not found: ghost"));
        assert_eq!(results[2].error.as_deref(), Some("Already whitelisted: stu"));

        assert!(matches!(
            svc.add_whitelist(&stu(), course.id, &ids).await,
            Err(CourseError::NotOwner)
        ));
    }

    #[tokio::test]
    async fn members_must_join_before_access() {
        let (svc, _) = setup().await;
        let course = svc.create_course(&prof(), "C").await.unwrap();

        assert!(matches!(
            svc.join(&stu(), course.id).await,
            Err(CourseError::NotWhitelisted)
        ));
        svc.add_whitelist(&prof(), course.id, &["stu".to_string()])
            .await
            .unwrap();
        // Pending entries do not grant access yet.
        assert!(matches!(
            svc.list_problems(&stu(), course.id).await,
            Err(CourseError::NotWhitelisted)
        ));
        svc.join(&stu(), course.id).await.unwrap();
        assert!(svc.list_problems(&stu(), course.id).await.is_ok());

        let removed = svc
            .remove_whitelist(&prof(), course.id, &["stu".to_string(), "stu2".to_string()])
            .await
            .unwrap();
        assert!(removed[0].success);
        assert!(!removed[1].success);
        assert!(matches!(
            svc.list_problems(&stu(), course.id).await,
            Err(CourseError::NotWhitelisted)
        ));
    }

    #[tokio::test]
    async fn hidden_answers_are_owner_only() {
        let (svc, _) = setup().await;
        let course = svc.create_course(&prof(), "C").await.unwrap();
        let problem = svc
            .create_problem(&prof(), course.id, "Sum", &json!({"description": "a+b"}))
            .await
            .unwrap();
        let results = svc
            .add_answers(
                &prof(),
                course.id,
                problem.id,
                &[
                    NewAnswer {
                        input: "1 2".into(),
                        output: "3".into(),
                        hidden: false,
                    },
                    NewAnswer {
                        input: "2 2".into(),
                        output: "4".into(),
                        hidden: true,
                    },
                    NewAnswer {
                        input: "x".into(),
                        output: String::new(),
                        hidden: true,
                    },
                ],
            )
            .await
            .unwrap();
        assert_eq!(
            results.iter().map(|r| r.success).collect::<Vec<_>>(),
            vec![true, true, false]
        );

        svc.add_whitelist(&prof(), course.id, &["stu".to_string()])
            .await
            .unwrap();
        svc.join(&stu(), course.id).await.unwrap();

        let as_owner = svc.get_problem(&prof(), course.id, problem.id).await.unwrap();
        assert_eq!(as_owner.answers.len(), 2);
        let as_member = svc.get_problem(&stu(), course.id, problem.id).await.unwrap();
        assert_eq!(as_member.answers.len(), 1);
        assert!(!as_member.answers[0].hidden);
    }

    #[tokio::test]
    async fn problem_update_and_delete() {
        let (svc, _) = setup().await;
        let course = svc.create_course(&prof(), "C").await.unwrap();
        let problem = svc
            .create_problem(&prof(), course.id, "Old", &json!({}))
            .await
            .unwrap();
        let patch = ProblemPatch {
            title: Some("New".into()),
            body: None,
        };
        let updated = svc
            .update_problem(&prof(), course.id, problem.id, &patch)
            .await
            .unwrap();
        assert_eq!(updated.title, "New");

        svc.delete_problem(&prof(), course.id, problem.id).await.unwrap();
        assert!(matches!(
            svc.delete_problem(&prof(), course.id, problem.id).await,
            Err(CourseError::ProblemNotFound)
        ));
    }

    #[tokio::test]
    async fn solutions_are_private_to_submitter_and_owner() {
        let (svc, _) = setup().await;
        let course = svc.create_course(&prof(), "C").await.unwrap();
        let problem = svc
            .create_problem(&prof(), course.id, "P", &json!({}))
            .await
            .unwrap();
        svc.add_whitelist(&prof(), course.id, &["stu".to_string(), "stu2".to_string()])
            .await
            .unwrap();
        let stu2 = principal("stu2", Role::Student);
        svc.join(&stu(), course.id).await.unwrap();
        svc.join(&stu2, course.id).await.unwrap();

        let submitted = svc
            .submit_solution(
                &stu(),
                course.id,
                problem.id,
                &NewSolution {
                    source: "print(3)".into(),
                    language: "python".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(submitted.verdict, Verdict::Pending);

        assert!(svc.get_solution(&stu(), course.id, submitted.id).await.is_ok());
        assert!(svc.get_solution(&prof(), course.id, submitted.id).await.is_ok());
        assert!(matches!(
            svc.get_solution(&stu2, course.id, submitted.id).await,
            Err(CourseError::SolutionNotFound)
        ));

        assert_eq!(svc.list_solutions(&stu(), course.id).await.unwrap().len(), 1);
        assert!(svc.list_solutions(&stu2, course.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn outsiders_cannot_submit() {
        let (svc, _) = setup().await;
        let course = svc.create_course(&prof(), "C").await.unwrap();
        let problem = svc
            .create_problem(&prof(), course.id, "P", &json!({}))
            .await
            .unwrap();
        let result = svc
            .submit_solution(
                &stu(),
                course.id,
                problem.id,
                &NewSolution {
                    source: "x".into(),
                    language: "c".into(),
                },
            )
            .await;
        assert!(matches!(result, Err(CourseError::NotWhitelisted)));
    }
}
