//! Access guard: Bearer token extraction, verification and role check.

use std::sync::Arc;

use axum::extract::{MatchedPath, Request, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use judge_core::auth::{AuthService, check_role};
use judge_core::models::auth::{Principal, Role};
use tracing::debug;

use super::roles::RoleTable;
use crate::error::AppError;

/// Verified caller, stored in request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Principal);

/// State of the guard layer.
#[derive(Clone)]
pub struct GuardState {
    pub auth: AuthService,
    pub roles: Arc<RoleTable>,
}

/// Outcome of the guard for one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Proceed, with the principal when a credential was presented.
    Allow(Option<Principal>),
    /// Missing or rejected credential on a protected route.
    Unauthenticated,
    /// Verified, but the role is not allowed.
    Forbidden,
}

/// Token from `Authorization: Bearer <token>`. Any other scheme counts as
/// no credential.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Decide access for a request given its credential and the route's roles.
pub async fn decide(auth: &AuthService, token: Option<&str>, required: &[Role]) -> Decision {
    let Some(token) = token else {
        return if required.is_empty() {
            Decision::Allow(None)
        } else {
            Decision::Unauthenticated
        };
    };

    let claims = match auth.verify_token(token).await {
        Ok(claims) => claims,
        Err(e) => {
            debug!(error = %e, "token rejected by guard");
            return Decision::Unauthenticated;
        }
    };

    let principal = Principal::from(&claims);
    match check_role(&principal, required) {
        Ok(()) => Decision::Allow(Some(principal)),
        Err(_) => Decision::Forbidden,
    }
}

/// Axum middleware enforcing the role table. Must be installed with
/// `route_layer` so the matched route template is known.
pub async fn require_roles(
    State(guard): State<GuardState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned());
    let required = guard.roles.required(request.method(), &path);

    match decide(&guard.auth, bearer_token(request.headers()), required).await {
        Decision::Allow(principal) => {
            if let Some(principal) = principal {
                request.extensions_mut().insert(AuthenticatedUser(principal));
            }
            Ok(next.run(request).await)
        }
        Decision::Unauthenticated => Err(AppError::Unauthorized("Authentication required".into())),
        Decision::Forbidden => Err(AppError::Forbidden("Insufficient role".into())),
    }
}
