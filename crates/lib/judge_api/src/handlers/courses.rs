//! Course request handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use judge_core::models::course::{Course, CourseDetail, CourseSummary};

use crate::AppState;
use crate::error::AppResult;
use crate::extract::ApiJson;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{ApiResponse, CourseRequest, PageQuery};

/// `POST /courses`: The caller becomes the owner.
pub async fn create_course_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(principal)): Extension<AuthenticatedUser>,
    ApiJson(body): ApiJson<CourseRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Course>>)> {
    let course = state.courses.create_course(&principal, &body.title).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Course created", course)),
    ))
}

/// `GET /courses?limit=&offset=`
pub async fn list_courses_handler(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<Vec<CourseSummary>>>> {
    let courses = state.courses.list_courses(page.limit, page.offset).await?;
    Ok(Json(ApiResponse::ok("Courses", courses)))
}

/// `GET /courses/{course_id}`
pub async fn get_course_handler(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
) -> AppResult<Json<ApiResponse<CourseDetail>>> {
    let detail = state.courses.get_course(course_id).await?;
    Ok(Json(ApiResponse::ok("Course", detail)))
}

/// `PATCH /courses/{course_id}`
pub async fn update_course_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(principal)): Extension<AuthenticatedUser>,
    Path(course_id): Path<i64>,
    ApiJson(body): ApiJson<CourseRequest>,
) -> AppResult<Json<ApiResponse<Course>>> {
    let course = state
        .courses
        .update_course(&principal, course_id, &body.title)
        .await?;
    Ok(Json(ApiResponse::ok("Course updated", course)))
}

/// `DELETE /courses/{course_id}`
pub async fn delete_course_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(principal)): Extension<AuthenticatedUser>,
    Path(course_id): Path<i64>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.courses.delete_course(&principal, course_id).await?;
    Ok(Json(ApiResponse::done("Course deleted")))
}
