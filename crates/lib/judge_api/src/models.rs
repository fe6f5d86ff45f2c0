//! Request and response bodies.

use serde::{Deserialize, Serialize};

/// Response envelope shared by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

impl ApiResponse<()> {
    /// Success without a payload.
    pub fn done(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }
}

// --- auth ---

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Role the client claims. Informational only.
    #[serde(default)]
    pub role: Option<String>,
    pub id: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub id: String,
    pub password: String,
    pub nick_name: String,
    #[serde(default)]
    pub student_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct WithdrawRequest {
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenData {
    pub token: String,
}

// --- courses ---

#[derive(Debug, Deserialize)]
pub struct CourseRequest {
    pub title: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct WhitelistRequest {
    pub user_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProblemRequest {
    pub title: String,
    #[serde(default)]
    pub body: serde_json::Value,
}

// --- admin ---

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: String,
}

// --- health ---

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthData {
    pub version: String,
    pub store: String,
}
