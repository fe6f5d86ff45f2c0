//! Shared helpers for router-level tests against the in-memory store.

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use judge_api::config::ApiConfig;
use judge_api::{AppState, router};
use serde_json::Value;
use tower::ServiceExt;

pub struct TestApp {
    pub state: AppState,
    pub app: Router,
}

pub fn app() -> TestApp {
    let state = AppState::in_memory(ApiConfig::for_tests("test-secret"));
    let app = router(state.clone());
    TestApp { state, app }
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub json: Value,
}

impl TestApp {
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Reply {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };

        let resp = self.app.clone().oneshot(req).await.expect("request");
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("read body");
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Reply {
            status,
            headers,
            json,
        }
    }

    pub async fn register(&self, id: &str, nick: &str, student_id: i64) -> Reply {
        self.send(
            Method::POST,
            "/auth/register",
            None,
            Some(serde_json::json!({
                "id": id,
                "password": "pw",
                "nick_name": nick,
                "student_id": student_id,
            })),
        )
        .await
    }

    /// Log in with password `pw` and return the bearer token.
    pub async fn login(&self, id: &str) -> String {
        let reply = self
            .send(
                Method::POST,
                "/auth/login",
                None,
                Some(serde_json::json!({ "role": "student", "id": id, "password": "pw" })),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "login {id}: {}", reply.json);
        reply.json["data"]["token"]
            .as_str()
            .expect("token in body")
            .to_string()
    }
}
