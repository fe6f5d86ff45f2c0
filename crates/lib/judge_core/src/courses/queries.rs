//! Course-related database queries.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::course::{
    Answer, Course, CourseSummary, NewAnswer, NewSolution, Problem, ProblemPatch, Solution,
    Verdict, WhitelistEntry,
};
use crate::store::StoreError;

type CourseRow = (i64, String, DateTime<Utc>, Option<DateTime<Utc>>);
type WhitelistRow = (i64, i64, String, bool, DateTime<Utc>, Option<DateTime<Utc>>);
type ProblemRow = (
    i64,
    i64,
    String,
    serde_json::Value,
    DateTime<Utc>,
    Option<DateTime<Utc>>,
);
type SolutionRow = (
    i64,
    i64,
    String,
    String,
    String,
    String,
    Option<i32>,
    Option<i32>,
    DateTime<Utc>,
);

const PROBLEM_COLUMNS: &str = "id, course_id, title, body, created_at, deleted_at";
const SOLUTION_COLUMNS: &str = "s.id, s.problem_id, s.user_id, s.source, s.language, \
     s.verdict::text, s.runtime_ms, s.memory_kb, s.created_at";

fn course_from_row((id, title, created_at, deleted_at): CourseRow) -> Course {
    Course {
        id,
        title,
        created_at,
        deleted_at,
    }
}

fn whitelist_from_row(
    (id, course_id, user_id, accepted, created_at, deleted_at): WhitelistRow,
) -> WhitelistEntry {
    WhitelistEntry {
        id,
        course_id,
        user_id,
        accepted,
        created_at,
        deleted_at,
    }
}

fn problem_from_row(
    (id, course_id, title, body, created_at, deleted_at): ProblemRow,
) -> Problem {
    Problem {
        id,
        course_id,
        title,
        body,
        created_at,
        deleted_at,
    }
}

fn solution_from_row(row: SolutionRow) -> Result<Solution, StoreError> {
    let (id, problem_id, user_id, source, language, verdict, runtime_ms, memory_kb, created_at) =
        row;
    Ok(Solution {
        id,
        problem_id,
        user_id,
        source,
        language,
        verdict: verdict.parse::<Verdict>().map_err(StoreError::Corrupt)?,
        runtime_ms,
        memory_kb,
        created_at,
    })
}

/// Insert a course and its owner link in one transaction.
pub async fn create_course(
    pool: &PgPool,
    title: &str,
    owner_id: &str,
) -> Result<Course, StoreError> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, CourseRow>(
        "INSERT INTO courses (title) VALUES ($1) RETURNING id, title, created_at, deleted_at",
    )
    .bind(title)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("INSERT INTO course_owners (course_id, user_id) VALUES ($1, $2)")
        .bind(row.0)
        .bind(owner_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(course_from_row(row))
}

/// List live courses with owner names and problem counts.
pub async fn list_courses(
    pool: &PgPool,
    limit: i64,
    offset: i64,
) -> Result<Vec<CourseSummary>, StoreError> {
    let rows = sqlx::query_as::<_, (i64, String, Vec<String>, i64, DateTime<Utc>)>(
        "SELECT c.id, c.title, \
           COALESCE(ARRAY(SELECT u.nick_name FROM course_owners o \
                          JOIN users u ON u.user_id = o.user_id AND u.deleted_at IS NULL \
                          WHERE o.course_id = c.id ORDER BY u.nick_name), '{}'), \
           (SELECT COUNT(*) FROM problems p WHERE p.course_id = c.id AND p.deleted_at IS NULL), \
           c.created_at \
         FROM courses c \
         WHERE c.deleted_at IS NULL \
         ORDER BY c.created_at DESC, c.id DESC \
         LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(
            |(id, title, owners, problem_count, created_at)| CourseSummary {
                id,
                title,
                owners,
                problem_count,
                created_at,
            },
        )
        .collect())
}

pub async fn find_course(pool: &PgPool, course_id: i64) -> Result<Option<Course>, StoreError> {
    let row = sqlx::query_as::<_, CourseRow>(
        "SELECT id, title, created_at, deleted_at FROM courses \
         WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(course_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(course_from_row))
}

pub async fn course_owners(pool: &PgPool, course_id: i64) -> Result<Vec<String>, StoreError> {
    let names = sqlx::query_scalar::<_, String>(
        "SELECT u.nick_name FROM course_owners o \
         JOIN users u ON u.user_id = o.user_id AND u.deleted_at IS NULL \
         WHERE o.course_id = $1 ORDER BY u.nick_name",
    )
    .bind(course_id)
    .fetch_all(pool)
    .await?;
    Ok(names)
}

pub async fn is_owner(pool: &PgPool, course_id: i64, user_id: &str) -> Result<bool, StoreError> {
    let owner = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM course_owners WHERE course_id = $1 AND user_id = $2)",
    )
    .bind(course_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(owner)
}

pub async fn update_course_title(
    pool: &PgPool,
    course_id: i64,
    title: &str,
) -> Result<Option<Course>, StoreError> {
    let row = sqlx::query_as::<_, CourseRow>(
        "UPDATE courses SET title = $2 WHERE id = $1 AND deleted_at IS NULL \
         RETURNING id, title, created_at, deleted_at",
    )
    .bind(course_id)
    .bind(title)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(course_from_row))
}

pub async fn soft_delete_course(
    pool: &PgPool,
    course_id: i64,
    at: DateTime<Utc>,
) -> Result<bool, StoreError> {
    let result =
        sqlx::query("UPDATE courses SET deleted_at = $2 WHERE id = $1 AND deleted_at IS NULL")
            .bind(course_id)
            .bind(at)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_whitelist(
    pool: &PgPool,
    course_id: i64,
) -> Result<Vec<WhitelistEntry>, StoreError> {
    let rows = sqlx::query_as::<_, WhitelistRow>(
        "SELECT id, course_id, user_id, accepted, created_at, deleted_at \
         FROM whitelist_entries WHERE course_id = $1 AND deleted_at IS NULL ORDER BY id",
    )
    .bind(course_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(whitelist_from_row).collect())
}

pub async fn add_whitelist(
    pool: &PgPool,
    course_id: i64,
    user_id: &str,
) -> Result<WhitelistEntry, StoreError> {
    let row = sqlx::query_as::<_, WhitelistRow>(
        "INSERT INTO whitelist_entries (course_id, user_id) VALUES ($1, $2) \
         RETURNING id, course_id, user_id, accepted, created_at, deleted_at",
    )
    .bind(course_id)
    .bind(user_id)
    .fetch_one(pool)
    .await
    .map_err(StoreError::from_insert)?;
    Ok(whitelist_from_row(row))
}

pub async fn remove_whitelist(
    pool: &PgPool,
    course_id: i64,
    user_id: &str,
    at: DateTime<Utc>,
) -> Result<bool, StoreError> {
    let result = sqlx::query(
        "UPDATE whitelist_entries SET deleted_at = $3 \
         WHERE course_id = $1 AND user_id = $2 AND deleted_at IS NULL",
    )
    .bind(course_id)
    .bind(user_id)
    .bind(at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn accept_whitelist(
    pool: &PgPool,
    course_id: i64,
    user_id: &str,
) -> Result<bool, StoreError> {
    let result = sqlx::query(
        "UPDATE whitelist_entries SET accepted = TRUE \
         WHERE course_id = $1 AND user_id = $2 AND deleted_at IS NULL",
    )
    .bind(course_id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn is_member(pool: &PgPool, course_id: i64, user_id: &str) -> Result<bool, StoreError> {
    let member = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM whitelist_entries \
         WHERE course_id = $1 AND user_id = $2 AND accepted AND deleted_at IS NULL)",
    )
    .bind(course_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(member)
}

pub async fn create_problem(
    pool: &PgPool,
    course_id: i64,
    title: &str,
    body: &serde_json::Value,
) -> Result<Problem, StoreError> {
    let row = sqlx::query_as::<_, ProblemRow>(&format!(
        "INSERT INTO problems (course_id, title, body) VALUES ($1, $2, $3) \
         RETURNING {PROBLEM_COLUMNS}"
    ))
    .bind(course_id)
    .bind(title)
    .bind(body)
    .fetch_one(pool)
    .await?;
    Ok(problem_from_row(row))
}

pub async fn list_problems(pool: &PgPool, course_id: i64) -> Result<Vec<Problem>, StoreError> {
    let rows = sqlx::query_as::<_, ProblemRow>(&format!(
        "SELECT {PROBLEM_COLUMNS} FROM problems \
         WHERE course_id = $1 AND deleted_at IS NULL ORDER BY id"
    ))
    .bind(course_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(problem_from_row).collect())
}

pub async fn find_problem(
    pool: &PgPool,
    course_id: i64,
    problem_id: i64,
) -> Result<Option<Problem>, StoreError> {
    let row = sqlx::query_as::<_, ProblemRow>(&format!(
        "SELECT {PROBLEM_COLUMNS} FROM problems \
         WHERE id = $1 AND course_id = $2 AND deleted_at IS NULL"
    ))
    .bind(problem_id)
    .bind(course_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(problem_from_row))
}

pub async fn update_problem(
    pool: &PgPool,
    course_id: i64,
    problem_id: i64,
    patch: &ProblemPatch,
) -> Result<Option<Problem>, StoreError> {
    let row = sqlx::query_as::<_, ProblemRow>(&format!(
        "UPDATE problems SET title = COALESCE($3, title), body = COALESCE($4, body) \
         WHERE id = $1 AND course_id = $2 AND deleted_at IS NULL \
         RETURNING {PROBLEM_COLUMNS}"
    ))
    .bind(problem_id)
    .bind(course_id)
    .bind(patch.title.as_deref())
    .bind(patch.body.as_ref())
    .fetch_optional(pool)
    .await?;
    Ok(row.map(problem_from_row))
}

pub async fn soft_delete_problem(
    pool: &PgPool,
    course_id: i64,
    problem_id: i64,
    at: DateTime<Utc>,
) -> Result<bool, StoreError> {
    let result = sqlx::query(
        "UPDATE problems SET deleted_at = $3 \
         WHERE id = $1 AND course_id = $2 AND deleted_at IS NULL",
    )
    .bind(problem_id)
    .bind(course_id)
    .bind(at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn create_answer(
    pool: &PgPool,
    problem_id: i64,
    answer: &NewAnswer,
) -> Result<Answer, StoreError> {
    let (id, problem_id, input, output, hidden) =
        sqlx::query_as::<_, (i64, i64, String, String, bool)>(
            "INSERT INTO answers (problem_id, input, output, hidden) VALUES ($1, $2, $3, $4) \
             RETURNING id, problem_id, input, output, hidden",
        )
        .bind(problem_id)
        .bind(&answer.input)
        .bind(&answer.output)
        .bind(answer.hidden)
        .fetch_one(pool)
        .await?;
    Ok(Answer {
        id,
        problem_id,
        input,
        output,
        hidden,
    })
}

pub async fn list_answers(
    pool: &PgPool,
    problem_id: i64,
    include_hidden: bool,
) -> Result<Vec<Answer>, StoreError> {
    let rows = sqlx::query_as::<_, (i64, i64, String, String, bool)>(
        "SELECT id, problem_id, input, output, hidden FROM answers \
         WHERE problem_id = $1 AND ($2 OR NOT hidden) ORDER BY id",
    )
    .bind(problem_id)
    .bind(include_hidden)
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|(id, problem_id, input, output, hidden)| Answer {
            id,
            problem_id,
            input,
            output,
            hidden,
        })
        .collect())
}

pub async fn create_solution(
    pool: &PgPool,
    problem_id: i64,
    user_id: &str,
    solution: &NewSolution,
) -> Result<Solution, StoreError> {
    let row = sqlx::query_as::<_, SolutionRow>(&format!(
        "INSERT INTO solutions AS s (problem_id, user_id, source, language) \
         VALUES ($1, $2, $3, $4) RETURNING {SOLUTION_COLUMNS}"
    ))
    .bind(problem_id)
    .bind(user_id)
    .bind(&solution.source)
    .bind(&solution.language)
    .fetch_one(pool)
    .await?;
    solution_from_row(row)
}

pub async fn find_solution(
    pool: &PgPool,
    course_id: i64,
    solution_id: i64,
) -> Result<Option<Solution>, StoreError> {
    let row = sqlx::query_as::<_, SolutionRow>(&format!(
        "SELECT {SOLUTION_COLUMNS} FROM solutions s \
         JOIN problems p ON p.id = s.problem_id \
         WHERE s.id = $1 AND p.course_id = $2"
    ))
    .bind(solution_id)
    .bind(course_id)
    .fetch_optional(pool)
    .await?;
    row.map(solution_from_row).transpose()
}

pub async fn list_solutions(
    pool: &PgPool,
    course_id: i64,
    user_id: &str,
) -> Result<Vec<Solution>, StoreError> {
    let rows = sqlx::query_as::<_, SolutionRow>(&format!(
        "SELECT {SOLUTION_COLUMNS} FROM solutions s \
         JOIN problems p ON p.id = s.problem_id \
         WHERE p.course_id = $1 AND s.user_id = $2 \
         ORDER BY s.created_at DESC, s.id DESC"
    ))
    .bind(course_id)
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(solution_from_row).collect()
}
