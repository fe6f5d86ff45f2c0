//! Admin handlers.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use judge_core::models::auth::Role;
use tracing::info;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::ApiJson;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{ApiResponse, RoleRequest};

/// `PATCH /admin/users/{user_id}/role`
pub async fn set_role_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(admin)): Extension<AuthenticatedUser>,
    Path(user_id): Path<String>,
    ApiJson(body): ApiJson<RoleRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    let role = body
        .role
        .parse::<Role>()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    state.auth.set_role(&user_id, role).await?;
    info!(admin = %admin.user_id, target = %user_id, %role, "role assigned");
    Ok(Json(ApiResponse::done("Role updated")))
}
