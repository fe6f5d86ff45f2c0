//! Authentication domain models.
//!
//! These are internal domain models. The wire shapes of the auth endpoints
//! live in `judge_api::models`; only `TokenClaims` has a fixed external form
//! because it is the JWT payload.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Permission level of a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Professor,
    Admin,
}

impl Role {
    /// Every role, lowest privilege first.
    pub const ALL: [Role; 3] = [Role::Student, Role::Professor, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Professor => "professor",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "professor" => Ok(Role::Professor),
            "admin" => Ok(Role::Admin),
            _ => Err(ParseRoleError(s.to_string())),
        }
    }
}

/// Stored user record.
#[derive(Debug, Clone)]
pub struct User {
    /// Login id chosen at registration.
    pub user_id: String,
    pub password_hash: String,
    /// Unique display name (`nick_name` on the wire).
    pub display_name: String,
    /// Optional external number such as a student id.
    pub external_id: Option<i64>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    /// Soft delete marker set by withdrawal.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Fields needed to create a user. The role always starts as `student`.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_id: String,
    pub password_hash: String,
    pub display_name: String,
    pub external_id: Option<i64>,
}

/// A unique user field that collided during registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DuplicateField {
    Id,
    Nickname,
    StudentId,
}

impl DuplicateField {
    pub fn as_str(&self) -> &'static str {
        match self {
            DuplicateField::Id => "id",
            DuplicateField::Nickname => "nickname",
            DuplicateField::StudentId => "studentId",
        }
    }
}

impl fmt::Display for DuplicateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record of a session token handed to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token_id: Uuid,
    pub user_id: String,
    pub token_value: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// JWT claims embedded in session tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Login id of the token owner.
    #[serde(rename = "userId")]
    pub user_id: String,
    pub nick_name: String,
    pub student_id: Option<i64>,
    /// Role read from the user record at issue time.
    pub role: Role,
    /// Random token id; two tokens issued within the same second still differ.
    pub jti: String,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiry (unix timestamp).
    pub exp: i64,
}

/// Request-scoped identity built from verified claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub role: Role,
}

impl From<&TokenClaims> for Principal {
    fn from(claims: &TokenClaims) -> Self {
        Self {
            user_id: claims.user_id.clone(),
            role: claims.role,
        }
    }
}
