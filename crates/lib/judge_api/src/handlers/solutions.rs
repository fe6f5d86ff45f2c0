//! Solution submission handlers. Judging itself happens elsewhere; new
//! solutions start out `pending`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use judge_core::models::course::{NewSolution, Solution};

use crate::AppState;
use crate::error::AppResult;
use crate::extract::ApiJson;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::ApiResponse;

/// `POST /courses/{course_id}/problems/{problem_id}/solutions`
pub async fn submit_solution_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(principal)): Extension<AuthenticatedUser>,
    Path((course_id, problem_id)): Path<(i64, i64)>,
    ApiJson(body): ApiJson<NewSolution>,
) -> AppResult<(StatusCode, Json<ApiResponse<Solution>>)> {
    let solution = state
        .courses
        .submit_solution(&principal, course_id, problem_id, &body)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Solution submitted", solution)),
    ))
}

/// `GET /courses/{course_id}/solutions`
pub async fn list_solutions_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(principal)): Extension<AuthenticatedUser>,
    Path(course_id): Path<i64>,
) -> AppResult<Json<ApiResponse<Vec<Solution>>>> {
    let solutions = state.courses.list_solutions(&principal, course_id).await?;
    Ok(Json(ApiResponse::ok("Solutions", solutions)))
}

/// `GET /courses/{course_id}/solutions/{solution_id}`
pub async fn get_solution_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(principal)): Extension<AuthenticatedUser>,
    Path((course_id, solution_id)): Path<(i64, i64)>,
) -> AppResult<Json<ApiResponse<Solution>>> {
    let solution = state
        .courses
        .get_solution(&principal, course_id, solution_id)
        .await?;
    Ok(Json(ApiResponse::ok("Solution", solution)))
}
