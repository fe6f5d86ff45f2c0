//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use judge_core::auth::AuthError;
use judge_core::courses::CourseError;
use thiserror::Error;
use tracing::error;

use crate::models::ApiResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
///
/// Every variant renders as `{ "success": false, "message": ... }`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, m),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m),
            AppError::Forbidden(m) => (StatusCode::FORBIDDEN, m),
            AppError::Internal(detail) => {
                error!(%detail, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ApiResponse::<()>::failure(message))).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::UserNotFound => AppError::NotFound("User not found".into()),
            AuthError::DuplicateUser(_) | AuthError::ValidationError(_) => {
                AppError::Validation(e.to_string())
            }
            AuthError::InvalidCredentials | AuthError::InvalidToken => {
                AppError::Unauthorized(e.to_string())
            }
            AuthError::UnauthorizedRole => AppError::Forbidden(e.to_string()),
            AuthError::Store(inner) => AppError::Internal(inner.to_string()),
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<CourseError> for AppError {
    fn from(e: CourseError) -> Self {
        match e {
            CourseError::CourseNotFound
            | CourseError::ProblemNotFound
            | CourseError::SolutionNotFound => AppError::NotFound(e.to_string()),
            CourseError::NotOwner | CourseError::NotWhitelisted => {
                AppError::Forbidden(e.to_string())
            }
            CourseError::Validation(msg) => AppError::Validation(msg),
            CourseError::Store(inner) => AppError::Internal(inner.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_errors_map_to_statuses() {
        let cases = [
            (CourseError::CourseNotFound, StatusCode::NOT_FOUND),
            (CourseError::NotOwner, StatusCode::FORBIDDEN),
            (CourseError::NotWhitelisted, StatusCode::FORBIDDEN),
            (CourseError::Validation("x".into()), StatusCode::BAD_REQUEST),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn store_failures_hide_detail() {
        let err = AppError::from(AuthError::Internal("pool exhausted".into()));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
