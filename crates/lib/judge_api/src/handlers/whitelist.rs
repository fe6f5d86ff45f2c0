//! Course whitelist handlers.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use judge_core::courses::EntryResult;
use judge_core::models::course::WhitelistEntry;

use crate::AppState;
use crate::error::AppResult;
use crate::extract::ApiJson;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{ApiResponse, WhitelistRequest};

/// `GET /courses/{course_id}/whitelist`
pub async fn list_whitelist_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(principal)): Extension<AuthenticatedUser>,
    Path(course_id): Path<i64>,
) -> AppResult<Json<ApiResponse<Vec<WhitelistEntry>>>> {
    let entries = state.courses.list_whitelist(&principal, course_id).await?;
    Ok(Json(ApiResponse::ok("Whitelist", entries)))
}

/// `POST /courses/{course_id}/whitelist`: One result per requested user.
pub async fn add_whitelist_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(principal)): Extension<AuthenticatedUser>,
    Path(course_id): Path<i64>,
    ApiJson(body): ApiJson<WhitelistRequest>,
) -> AppResult<Json<ApiResponse<Vec<EntryResult<WhitelistEntry>>>>> {
    let results = state
        .courses
        .add_whitelist(&principal, course_id, &body.user_ids)
        .await?;
    Ok(Json(ApiResponse::ok("Whitelist updated", results)))
}

/// `DELETE /courses/{course_id}/whitelist`
pub async fn remove_whitelist_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(principal)): Extension<AuthenticatedUser>,
    Path(course_id): Path<i64>,
    ApiJson(body): ApiJson<WhitelistRequest>,
) -> AppResult<Json<ApiResponse<Vec<EntryResult<String>>>>> {
    let results = state
        .courses
        .remove_whitelist(&principal, course_id, &body.user_ids)
        .await?;
    Ok(Json(ApiResponse::ok("Whitelist updated", results)))
}

/// `POST /courses/{course_id}/join`
pub async fn join_course_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(principal)): Extension<AuthenticatedUser>,
    Path(course_id): Path<i64>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.courses.join(&principal, course_id).await?;
    Ok(Json(ApiResponse::done("Joined course")))
}
