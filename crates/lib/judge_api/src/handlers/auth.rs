//! Authentication request handlers.
//!
//! Each endpoint answers failures, including an unreadable body, with one
//! fixed status and message; the underlying reason is only logged.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use judge_core::auth::AuthError;
use judge_core::models::auth::Role;
use tracing::{debug, error};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::body_or;
use crate::middleware::auth::bearer_token;
use crate::models::{
    ApiResponse, LoginRequest, LogoutRequest, RefreshRequest, RegisterRequest, TokenData,
    WithdrawRequest,
};

fn rejected(op: &'static str, e: &AuthError) {
    match e {
        AuthError::Store(_) | AuthError::Internal(_) => {
            error!(op, error = %e, "auth operation failed")
        }
        _ => debug!(op, error = %e, "auth operation rejected"),
    }
}

fn with_token(message: &str, token: String) -> Response {
    (
        StatusCode::OK,
        [(header::AUTHORIZATION, format!("Bearer {token}"))],
        Json(ApiResponse::ok(message, TokenData { token })),
    )
        .into_response()
}

/// `POST /auth/login`
pub async fn login_handler(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Response> {
    let failed = || AppError::Unauthorized("Login failed".into());
    let body = body_or(body, "login", failed)?;
    let claimed = body.role.as_deref().and_then(|r| r.parse::<Role>().ok());
    match state.auth.login(&body.id, &body.password, claimed).await {
        Ok(token) => Ok(with_token("Login succeeded", token)),
        Err(e) => {
            rejected("login", &e);
            Err(failed())
        }
    }
}

/// `POST /auth/register`: New accounts are always students.
pub async fn register_handler(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<()>>)> {
    let failed = || AppError::Validation("Registration failed".into());
    let body = body_or(body, "register", failed)?;
    match state
        .auth
        .register(&body.id, &body.password, &body.nick_name, body.student_id)
        .await
    {
        Ok(()) => Ok((
            StatusCode::CREATED,
            Json(ApiResponse::done("Registration succeeded")),
        )),
        Err(e @ (AuthError::DuplicateUser(_) | AuthError::ValidationError(_))) => {
            rejected("register", &e);
            Err(AppError::Validation(e.to_string()))
        }
        Err(e) => {
            rejected("register", &e);
            Err(failed())
        }
    }
}

/// `POST /auth/refresh`
pub async fn refresh_handler(
    State(state): State<AppState>,
    body: Result<Json<RefreshRequest>, JsonRejection>,
) -> AppResult<Response> {
    let failed = || AppError::Unauthorized("Token refresh failed".into());
    let body = body_or(body, "refresh", failed)?;
    match state.auth.refresh(&body.refresh_token).await {
        Ok(token) => Ok(with_token("Token refreshed", token)),
        Err(e) => {
            rejected("refresh", &e);
            Err(failed())
        }
    }
}

/// `DELETE /auth/logout`: Revokes exactly the given token.
pub async fn logout_handler(
    State(state): State<AppState>,
    body: Result<Json<LogoutRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<()>>> {
    let failed = || AppError::Unauthorized("Logout failed".into());
    let body = body_or(body, "logout", failed)?;
    match state.auth.logout(&body.token).await {
        Ok(()) => Ok(Json(ApiResponse::done("Logout succeeded"))),
        Err(e) => {
            rejected("logout", &e);
            Err(failed())
        }
    }
}

/// `DELETE /auth/withdraw`: The caller must hold a valid token for the
/// same account, or be an admin.
pub async fn withdraw_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<WithdrawRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<()>>> {
    let failed = || AppError::Unauthorized("Withdrawal failed".into());
    let body = body_or(body, "withdraw", failed)?;

    let token = bearer_token(&headers).ok_or_else(failed)?;
    let claims = match state.auth.verify_token(token).await {
        Ok(claims) => claims,
        Err(e) => {
            rejected("withdraw", &e);
            return Err(failed());
        }
    };
    if claims.user_id != body.id && claims.role != Role::Admin {
        debug!(caller = %claims.user_id, target = %body.id, "withdrawal of another account refused");
        return Err(failed());
    }

    match state.auth.withdraw(&body.id).await {
        Ok(()) => Ok(Json(ApiResponse::done("Withdrawal succeeded"))),
        Err(e) => {
            rejected("withdraw", &e);
            Err(failed())
        }
    }
}
