//! # judge_api
//!
//! HTTP API library for Judge.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::http::Method;
use axum::routing::{delete, get, patch, post};
use judge_core::auth::{AuthService, TokenCodec};
use judge_core::courses::CourseService;
use judge_core::models::auth::Role;
use judge_core::store::{CourseStore, MemoryStore, PgStore, TokenStore, UserStore};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{admin, auth, courses, health, problems, solutions, whitelist};
use crate::middleware::auth::{GuardState, require_roles};
use crate::middleware::roles::RoleTable;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub courses: CourseService,
    /// API configuration.
    pub config: ApiConfig,
    /// Backend name reported by `/health`.
    pub store_kind: &'static str,
}

impl AppState {
    /// State backed by PostgreSQL.
    pub fn with_postgres(pool: PgPool, config: ApiConfig) -> Self {
        Self::from_store(Arc::new(PgStore::new(pool)), config, "postgres")
    }

    /// State backed by a process-local store. Nothing survives a restart.
    pub fn in_memory(config: ApiConfig) -> Self {
        Self::from_store(Arc::new(MemoryStore::new()), config, "memory")
    }

    fn from_store<S>(store: Arc<S>, config: ApiConfig, store_kind: &'static str) -> Self
    where
        S: UserStore + TokenStore + CourseStore + 'static,
    {
        let codec = TokenCodec::new(config.jwt_secret.as_bytes());
        Self {
            auth: AuthService::new(store.clone(), store.clone(), codec),
            courses: CourseService::new(store.clone(), store),
            config,
            store_kind,
        }
    }
}

/// Run embedded database migrations.
///
/// Delegates to `judge_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    judge_core::migrate::migrate(pool).await
}

const STAFF: &[Role] = &[Role::Professor, Role::Admin];

/// Roles required by each guarded route.
///
/// Everything under `/courses` needs a signed-in user unless listed
/// otherwise; `/admin` is admin only.
pub fn role_table() -> RoleTable {
    RoleTable::new()
        .group(routes::COURSES, &Role::ALL)
        .group("/admin", &[Role::Admin])
        .route(Method::GET, routes::COURSES, &[])
        .route(Method::GET, routes::COURSE, &[])
        .route(Method::POST, routes::COURSES, STAFF)
        .route(Method::PATCH, routes::COURSE, STAFF)
        .route(Method::DELETE, routes::COURSE, STAFF)
        .route(Method::GET, routes::COURSE_WHITELIST, STAFF)
        .route(Method::POST, routes::COURSE_WHITELIST, STAFF)
        .route(Method::DELETE, routes::COURSE_WHITELIST, STAFF)
        .route(Method::POST, routes::COURSE_PROBLEMS, STAFF)
        .route(Method::PATCH, routes::COURSE_PROBLEM, STAFF)
        .route(Method::DELETE, routes::COURSE_PROBLEM, STAFF)
        .route(Method::POST, routes::PROBLEM_ANSWERS, STAFF)
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Auth endpoints check credentials themselves.
    let open = Router::new()
        .route(routes::GET_HEALTH, get(health::health_handler))
        .route(routes::POST_AUTH_LOGIN, post(auth::login_handler))
        .route(routes::POST_AUTH_REGISTER, post(auth::register_handler))
        .route(routes::POST_AUTH_REFRESH, post(auth::refresh_handler))
        .route(routes::DELETE_AUTH_LOGOUT, delete(auth::logout_handler))
        .route(routes::DELETE_AUTH_WITHDRAW, delete(auth::withdraw_handler));

    let guard = GuardState {
        auth: state.auth.clone(),
        roles: Arc::new(role_table()),
    };

    let guarded = Router::new()
        .route(
            routes::COURSES,
            get(courses::list_courses_handler).post(courses::create_course_handler),
        )
        .route(
            routes::COURSE,
            get(courses::get_course_handler)
                .patch(courses::update_course_handler)
                .delete(courses::delete_course_handler),
        )
        .route(
            routes::COURSE_WHITELIST,
            get(whitelist::list_whitelist_handler)
                .post(whitelist::add_whitelist_handler)
                .delete(whitelist::remove_whitelist_handler),
        )
        .route(routes::COURSE_JOIN, post(whitelist::join_course_handler))
        .route(
            routes::COURSE_PROBLEMS,
            get(problems::list_problems_handler).post(problems::create_problem_handler),
        )
        .route(
            routes::COURSE_PROBLEM,
            get(problems::get_problem_handler)
                .patch(problems::update_problem_handler)
                .delete(problems::delete_problem_handler),
        )
        .route(routes::PROBLEM_ANSWERS, post(problems::add_answers_handler))
        .route(
            routes::PROBLEM_SOLUTIONS,
            post(solutions::submit_solution_handler),
        )
        .route(
            routes::COURSE_SOLUTIONS,
            get(solutions::list_solutions_handler),
        )
        .route(routes::COURSE_SOLUTION, get(solutions::get_solution_handler))
        .route(routes::ADMIN_USER_ROLE, patch(admin::set_role_handler))
        .route_layer(axum::middleware::from_fn_with_state(guard, require_roles));

    Router::new()
        .merge(open)
        .merge(guarded)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_mutating_course_route_needs_staff() {
        let t = role_table();
        assert_eq!(t.required(&Method::POST, routes::COURSES), STAFF);
        assert_eq!(t.required(&Method::POST, routes::PROBLEM_ANSWERS), STAFF);
        assert_eq!(t.required(&Method::POST, routes::COURSE_JOIN), &Role::ALL);
        assert_eq!(
            t.required(&Method::POST, routes::PROBLEM_SOLUTIONS),
            &Role::ALL
        );
        assert!(t.required(&Method::GET, routes::COURSE).is_empty());
        assert_eq!(
            t.required(&Method::PATCH, routes::ADMIN_USER_ROLE),
            &[Role::Admin]
        );
    }
}
