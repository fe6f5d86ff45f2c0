//! Course, whitelist, problem and solution endpoints end to end.

mod common;

use axum::http::{Method, StatusCode};
use judge_core::models::auth::Role;
use serde_json::json;

/// Professor `prof` owning course `id`, student `stu` whitelisted and joined.
async fn course_with_member(t: &common::TestApp) -> (String, String, i64) {
    t.register("prof", "Prof", 1).await;
    t.register("stu", "Stu", 2).await;
    t.state.auth.set_role("prof", Role::Professor).await.unwrap();
    let prof = t.login("prof").await;
    let stu = t.login("stu").await;

    let reply = t
        .send(
            Method::POST,
            "/courses",
            Some(&prof),
            Some(json!({ "title": "Algorithms" })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::CREATED);
    let course_id = reply.json["data"]["id"].as_i64().unwrap();

    let reply = t
        .send(
            Method::POST,
            &format!("/courses/{course_id}/whitelist"),
            Some(&prof),
            Some(json!({ "user_ids": ["stu", "ghost"] })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json["data"][0]["success"], true);
    assert_eq!(reply.json["data"][1]["success"], false);

    let reply = t
        .send(
            Method::POST,
            &format!("/courses/{course_id}/join"),
            Some(&stu),
            None,
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);

    (prof, stu, course_id)
}

#[tokio::test]
async fn public_listing_shows_owner_names() {
    let t = common::app();
    let (_, _, course_id) = course_with_member(&t).await;

    let reply = t.send(Method::GET, "/courses", None, None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json["data"][0]["id"], course_id);
    assert_eq!(reply.json["data"][0]["owners"], json!(["Prof"]));

    let reply = t
        .send(Method::GET, &format!("/courses/{course_id}"), None, None)
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json["data"]["title"], "Algorithms");

    let missing = t.send(Method::GET, "/courses/999", None, None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.json["success"], false);
}

#[tokio::test]
async fn member_sees_only_visible_answers() {
    let t = common::app();
    let (prof, stu, course_id) = course_with_member(&t).await;

    let reply = t
        .send(
            Method::POST,
            &format!("/courses/{course_id}/problems"),
            Some(&prof),
            Some(json!({ "title": "A+B", "body": { "description": "add" } })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::CREATED);
    let problem_id = reply.json["data"]["id"].as_i64().unwrap();
    let problem_uri = format!("/courses/{course_id}/problems/{problem_id}");

    let reply = t
        .send(
            Method::POST,
            &format!("{problem_uri}/answers"),
            Some(&prof),
            Some(json!([
                { "input": "1 2", "output": "3", "hidden": false },
                { "input": "5 5", "output": "10" },
            ])),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json["data"].as_array().unwrap().len(), 2);

    let owner_view = t.send(Method::GET, &problem_uri, Some(&prof), None).await;
    assert_eq!(owner_view.json["data"]["answers"].as_array().unwrap().len(), 2);

    let member_view = t.send(Method::GET, &problem_uri, Some(&stu), None).await;
    assert_eq!(member_view.status, StatusCode::OK);
    let answers = member_view.json["data"]["answers"].as_array().unwrap();
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0]["output"], "3");

    let student_adds = t
        .send(
            Method::POST,
            &format!("{problem_uri}/answers"),
            Some(&stu),
            Some(json!([{ "input": "", "output": "0" }])),
        )
        .await;
    assert_eq!(student_adds.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn outsider_is_forbidden_from_problems() {
    let t = common::app();
    let (_, _, course_id) = course_with_member(&t).await;
    t.register("eve", "Eve", 3).await;
    let eve = t.login("eve").await;

    let reply = t
        .send(
            Method::GET,
            &format!("/courses/{course_id}/problems"),
            Some(&eve),
            None,
        )
        .await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    let anonymous = t
        .send(
            Method::GET,
            &format!("/courses/{course_id}/problems"),
            None,
            None,
        )
        .await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn submissions_are_pending_and_private() {
    let t = common::app();
    let (prof, stu, course_id) = course_with_member(&t).await;
    let reply = t
        .send(
            Method::POST,
            &format!("/courses/{course_id}/problems"),
            Some(&prof),
            Some(json!({ "title": "Echo" })),
        )
        .await;
    let problem_id = reply.json["data"]["id"].as_i64().unwrap();

    let reply = t
        .send(
            Method::POST,
            &format!("/courses/{course_id}/problems/{problem_id}/solutions"),
            Some(&stu),
            Some(json!({ "source": "print(input())", "language": "python" })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(reply.json["data"]["verdict"], "pending");
    let solution_id = reply.json["data"]["id"].as_i64().unwrap();
    let solution_uri = format!("/courses/{course_id}/solutions/{solution_id}");

    let mine = t
        .send(
            Method::GET,
            &format!("/courses/{course_id}/solutions"),
            Some(&stu),
            None,
        )
        .await;
    assert_eq!(mine.json["data"].as_array().unwrap().len(), 1);

    let owner = t.send(Method::GET, &solution_uri, Some(&prof), None).await;
    assert_eq!(owner.status, StatusCode::OK);

    t.register("eve", "Eve", 3).await;
    let eve = t.login("eve").await;
    let other = t.send(Method::GET, &solution_uri, Some(&eve), None).await;
    assert_eq!(other.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn only_owner_edits_course() {
    let t = common::app();
    let (_, _, course_id) = course_with_member(&t).await;
    t.register("prof2", "Prof2", 4).await;
    t.state
        .auth
        .set_role("prof2", Role::Professor)
        .await
        .unwrap();
    let prof2 = t.login("prof2").await;

    let reply = t
        .send(
            Method::PATCH,
            &format!("/courses/{course_id}"),
            Some(&prof2),
            Some(json!({ "title": "Hijacked" })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    let reply = t
        .send(
            Method::DELETE,
            &format!("/courses/{course_id}"),
            Some(&prof2),
            None,
        )
        .await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn malformed_course_body_is_400_envelope() {
    let t = common::app();
    let (prof, _, course_id) = course_with_member(&t).await;

    let reply = t
        .send(
            Method::PATCH,
            &format!("/courses/{course_id}"),
            Some(&prof),
            Some(json!({ "name": "Algorithms II" })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        reply.json,
        json!({ "success": false, "message": "Invalid request body" })
    );

    let reply = t
        .send(
            Method::POST,
            &format!("/courses/{course_id}/whitelist"),
            Some(&prof),
            None,
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json["success"], false);
}
