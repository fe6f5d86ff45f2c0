//! Course domain models: courses, whitelist entries, problems, answers and
//! solutions.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A course owned by one or more professors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Row of the course listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseSummary {
    pub id: i64,
    pub title: String,
    /// Display names of the owners.
    pub owners: Vec<String>,
    pub problem_count: i64,
    pub created_at: DateTime<Utc>,
}

/// A course together with its owners and live problems.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: Course,
    pub owners: Vec<String>,
    pub problems: Vec<Problem>,
}

/// Permission for a user to join a course.
///
/// Entries start pending and become accepted when the user joins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhitelistEntry {
    pub id: i64,
    pub course_id: i64,
    pub user_id: String,
    pub accepted: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    /// Free-form statement (description, input/output format, examples).
    pub body: serde_json::Value,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Partial update of a problem.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProblemPatch {
    pub title: Option<String>,
    pub body: Option<serde_json::Value>,
}

/// A problem with the test cases visible to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemDetail {
    #[serde(flatten)]
    pub problem: Problem,
    pub answers: Vec<Answer>,
}

/// A test case of a problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub id: i64,
    pub problem_id: i64,
    pub input: String,
    pub output: String,
    /// Hidden cases are only shown to course owners.
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAnswer {
    pub input: String,
    pub output: String,
    #[serde(default = "default_hidden")]
    pub hidden: bool,
}

fn default_hidden() -> bool {
    true
}

/// Judging outcome of a solution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    #[default]
    Pending,
    Correct,
    WrongAnswer,
    TimeLimit,
    MemoryLimit,
    RuntimeError,
    CompileError,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Pending => "pending",
            Verdict::Correct => "correct",
            Verdict::WrongAnswer => "wrong_answer",
            Verdict::TimeLimit => "time_limit",
            Verdict::MemoryLimit => "memory_limit",
            Verdict::RuntimeError => "runtime_error",
            Verdict::CompileError => "compile_error",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verdict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Verdict::Pending),
            "correct" => Ok(Verdict::Correct),
            "wrong_answer" => Ok(Verdict::WrongAnswer),
            "time_limit" => Ok(Verdict::TimeLimit),
            "memory_limit" => Ok(Verdict::MemoryLimit),
            "runtime_error" => Ok(Verdict::RuntimeError),
            "compile_error" => Ok(Verdict::CompileError),
            other => Err(format!("unknown verdict: {other}")),
        }
    }
}

/// A submitted solution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub id: i64,
    pub problem_id: i64,
    pub user_id: String,
    pub source: String,
    pub language: String,
    pub verdict: Verdict,
    pub runtime_ms: Option<i32>,
    pub memory_kb: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSolution {
    pub source: String,
    pub language: String,
}
