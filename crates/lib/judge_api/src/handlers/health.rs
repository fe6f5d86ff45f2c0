//! Liveness endpoint.

use axum::Json;
use axum::extract::State;

use crate::AppState;
use crate::models::{ApiResponse, HealthData};

/// `GET /health`
pub async fn health_handler(State(state): State<AppState>) -> Json<ApiResponse<HealthData>> {
    Json(ApiResponse::ok(
        "ok",
        HealthData {
            version: judge_core::version().to_string(),
            store: state.store_kind.to_string(),
        },
    ))
}
