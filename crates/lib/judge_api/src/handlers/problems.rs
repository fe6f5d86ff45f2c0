//! Problem and test-case handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use judge_core::courses::EntryResult;
use judge_core::models::course::{Answer, NewAnswer, Problem, ProblemDetail, ProblemPatch};

use crate::AppState;
use crate::error::AppResult;
use crate::extract::ApiJson;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{ApiResponse, ProblemRequest};

/// `POST /courses/{course_id}/problems`
pub async fn create_problem_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(principal)): Extension<AuthenticatedUser>,
    Path(course_id): Path<i64>,
    ApiJson(body): ApiJson<ProblemRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Problem>>)> {
    let problem = state
        .courses
        .create_problem(&principal, course_id, &body.title, &body.body)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Problem created", problem)),
    ))
}

/// `GET /courses/{course_id}/problems`
pub async fn list_problems_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(principal)): Extension<AuthenticatedUser>,
    Path(course_id): Path<i64>,
) -> AppResult<Json<ApiResponse<Vec<Problem>>>> {
    let problems = state.courses.list_problems(&principal, course_id).await?;
    Ok(Json(ApiResponse::ok("Problems", problems)))
}

/// `GET /courses/{course_id}/problems/{problem_id}`
pub async fn get_problem_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(principal)): Extension<AuthenticatedUser>,
    Path((course_id, problem_id)): Path<(i64, i64)>,
) -> AppResult<Json<ApiResponse<ProblemDetail>>> {
    let detail = state
        .courses
        .get_problem(&principal, course_id, problem_id)
        .await?;
    Ok(Json(ApiResponse::ok("Problem", detail)))
}

/// `PATCH /courses/{course_id}/problems/{problem_id}`
pub async fn update_problem_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(principal)): Extension<AuthenticatedUser>,
    Path((course_id, problem_id)): Path<(i64, i64)>,
    ApiJson(patch): ApiJson<ProblemPatch>,
) -> AppResult<Json<ApiResponse<Problem>>> {
    let problem = state
        .courses
        .update_problem(&principal, course_id, problem_id, &patch)
        .await?;
    Ok(Json(ApiResponse::ok("Problem updated", problem)))
}

/// `DELETE /courses/{course_id}/problems/{problem_id}`
pub async fn delete_problem_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(principal)): Extension<AuthenticatedUser>,
    Path((course_id, problem_id)): Path<(i64, i64)>,
) -> AppResult<Json<ApiResponse<()>>> {
    state
        .courses
        .delete_problem(&principal, course_id, problem_id)
        .await?;
    Ok(Json(ApiResponse::done("Problem deleted")))
}

/// `POST /courses/{course_id}/problems/{problem_id}/answers`
pub async fn add_answers_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(principal)): Extension<AuthenticatedUser>,
    Path((course_id, problem_id)): Path<(i64, i64)>,
    ApiJson(answers): ApiJson<Vec<NewAnswer>>,
) -> AppResult<Json<ApiResponse<Vec<EntryResult<Answer>>>>> {
    let results = state
        .courses
        .add_answers(&principal, course_id, problem_id, &answers)
        .await?;
    Ok(Json(ApiResponse::ok("Answers processed", results)))
}
