//! Auth endpoints and the guard, driven through the full router.

mod common;

use axum::http::{Method, StatusCode, header};
use judge_core::models::auth::Role;
use serde_json::json;

#[tokio::test]
async fn health_reports_memory_store() {
    let t = common::app();
    let reply = t.send(Method::GET, "/health", None, None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json["success"], true);
    assert_eq!(reply.json["data"]["store"], "memory");
}

#[tokio::test]
async fn register_login_and_header() {
    let t = common::app();
    let reply = t.register("alice", "Alice", 100).await;
    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(reply.json["success"], true);

    let reply = t
        .send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "id": "alice", "password": "pw" })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    let token = reply.json["data"]["token"].as_str().unwrap();
    let header = reply.headers[header::AUTHORIZATION].to_str().unwrap();
    assert_eq!(header, format!("Bearer {token}"));
}

#[tokio::test]
async fn duplicate_registration_names_every_field() {
    let t = common::app();
    t.register("alice", "Alice", 100).await;
    let reply = t.register("alice", "Alice", 100).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json["success"], false);
    assert_eq!(
        reply.json["message"],
        "Existing user. Duplicated elements: [ id, nickname, studentId ]"
    );
}

#[tokio::test]
async fn wrong_password_is_401_with_fixed_message() {
    let t = common::app();
    t.register("alice", "Alice", 100).await;
    let reply = t
        .send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "id": "alice", "password": "nope" })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.json, json!({ "success": false, "message": "Login failed" }));
}

#[tokio::test]
async fn refresh_invalidates_previous_token() {
    let t = common::app();
    t.register("alice", "Alice", 100).await;
    let t1 = t.login("alice").await;

    let reply = t
        .send(
            Method::POST,
            "/auth/refresh",
            None,
            Some(json!({ "refreshToken": t1 })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    let t2 = reply.json["data"]["token"].as_str().unwrap().to_string();

    let old = t.send(Method::POST, "/courses/1/join", Some(&t1), None).await;
    assert_eq!(old.status, StatusCode::UNAUTHORIZED);
    // Valid token, but no such course.
    let new = t.send(Method::POST, "/courses/1/join", Some(&t2), None).await;
    assert_eq!(new.status, StatusCode::NOT_FOUND);

    let again = t
        .send(
            Method::POST,
            "/auth/refresh",
            None,
            Some(json!({ "refreshToken": t1 })),
        )
        .await;
    assert_eq!(again.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_twice_fails() {
    let t = common::app();
    t.register("alice", "Alice", 100).await;
    let token = t.login("alice").await;

    let body = Some(json!({ "token": token }));
    let first = t.send(Method::DELETE, "/auth/logout", None, body.clone()).await;
    assert_eq!(first.status, StatusCode::OK);
    let second = t.send(Method::DELETE, "/auth/logout", None, body).await;
    assert_eq!(second.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unreadable_auth_bodies_get_the_fixed_envelope() {
    let t = common::app();
    t.register("alice", "Alice", 100).await;

    let reply = t
        .send(Method::POST, "/auth/login", None, Some(json!({ "id": "alice" })))
        .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.json, json!({ "success": false, "message": "Login failed" }));

    let reply = t.send(Method::DELETE, "/auth/logout", None, None).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.json, json!({ "success": false, "message": "Logout failed" }));

    let reply = t
        .send(Method::POST, "/auth/refresh", None, Some(json!({ "token": 1 })))
        .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        reply.json,
        json!({ "success": false, "message": "Token refresh failed" })
    );

    let reply = t
        .send(Method::POST, "/auth/register", None, Some(json!({ "id": "bob" })))
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        reply.json,
        json!({ "success": false, "message": "Registration failed" })
    );
}

#[tokio::test]
async fn student_is_denied_professor_route_then_withdraws() {
    let t = common::app();
    t.register("alice", "Alice", 100).await;
    let token = t.login("alice").await;

    let reply = t
        .send(
            Method::POST,
            "/courses",
            Some(&token),
            Some(json!({ "title": "Mine" })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.json["success"], false);

    let anonymous = t
        .send(Method::POST, "/courses", None, Some(json!({ "title": "Mine" })))
        .await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let reply = t
        .send(
            Method::DELETE,
            "/auth/withdraw",
            Some(&token),
            Some(json!({ "id": "alice" })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);

    let reply = t
        .send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "id": "alice", "password": "pw" })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert!(matches!(
        t.state.auth.login("alice", "pw", None).await,
        Err(judge_core::auth::AuthError::UserNotFound)
    ));
}

#[tokio::test]
async fn withdraw_requires_own_token() {
    let t = common::app();
    t.register("alice", "Alice", 100).await;
    t.register("bob", "Bob", 200).await;
    let bob = t.login("bob").await;

    let unauthenticated = t
        .send(Method::DELETE, "/auth/withdraw", None, Some(json!({ "id": "alice" })))
        .await;
    assert_eq!(unauthenticated.status, StatusCode::UNAUTHORIZED);

    let foreign = t
        .send(
            Method::DELETE,
            "/auth/withdraw",
            Some(&bob),
            Some(json!({ "id": "alice" })),
        )
        .await;
    assert_eq!(foreign.status, StatusCode::UNAUTHORIZED);
    assert!(t.state.auth.login("alice", "pw", None).await.is_ok());
}

#[tokio::test]
async fn claimed_admin_role_is_ignored() {
    let t = common::app();
    t.register("alice", "Alice", 100).await;
    let reply = t
        .send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "role": "admin", "id": "alice", "password": "pw" })),
        )
        .await;
    let token = reply.json["data"]["token"].as_str().unwrap();
    let claims = t.state.auth.verify_token(token).await.unwrap();
    assert_eq!(claims.role, Role::Student);

    let admin_only = t
        .send(
            Method::PATCH,
            "/admin/users/alice/role",
            Some(token),
            Some(json!({ "role": "admin" })),
        )
        .await;
    assert_eq!(admin_only.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_assigns_roles() {
    let t = common::app();
    t.register("root", "Root", 1).await;
    t.register("alice", "Alice", 100).await;
    t.state.auth.set_role("root", Role::Admin).await.unwrap();
    let admin = t.login("root").await;

    let reply = t
        .send(
            Method::PATCH,
            "/admin/users/alice/role",
            Some(&admin),
            Some(json!({ "role": "professor" })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);

    let bad = t
        .send(
            Method::PATCH,
            "/admin/users/alice/role",
            Some(&admin),
            Some(json!({ "role": "overlord" })),
        )
        .await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);

    let missing = t
        .send(
            Method::PATCH,
            "/admin/users/ghost/role",
            Some(&admin),
            Some(json!({ "role": "student" })),
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let alice = t.login("alice").await;
    let reply = t
        .send(
            Method::POST,
            "/courses",
            Some(&alice),
            Some(json!({ "title": "Compilers" })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::CREATED);
}

#[tokio::test]
async fn garbage_token_on_open_course_listing_is_denied() {
    let t = common::app();
    let anonymous = t.send(Method::GET, "/courses", None, None).await;
    assert_eq!(anonymous.status, StatusCode::OK);
    let bad = t.send(Method::GET, "/courses", Some("garbage"), None).await;
    assert_eq!(bad.status, StatusCode::UNAUTHORIZED);
}
