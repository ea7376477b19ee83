mod common;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use common::app::spawn_test_app;
use common::fixtures::{problem_url, seed_catalog, seed_difficulties};
use common::http::{assert_json_error, assert_status_ok_json, call};
use problem_tracker::tracker::types::Difficulty;

async fn load_small_catalog(app: &common::app::TestApp, user: &str) {
    seed_difficulties(
        app.state.store(),
        &[
            ("two-sum", Difficulty::Easy),
            ("contains-duplicate", Difficulty::Easy),
            ("3sum", Difficulty::Medium),
            ("word-ladder", Difficulty::Hard),
        ],
    );
    let catalog = json!({"result": {
        "Arrays": [problem_url("two-sum"), problem_url("contains-duplicate"), problem_url("3sum")],
        "Graphs": [problem_url("word-ladder")]
    }});
    let (status, body) = call(&app.app, Method::POST, "/api/catalog", Some(catalog), user).await;
    assert_status_ok_json(status, &body);
}

async fn post_url(app: &common::app::TestApp, path: &str, url: &str, user: &str) -> (StatusCode, Value) {
    call(&app.app, Method::POST, path, Some(json!({"url": url})), user).await
}

#[tokio::test]
async fn it_complete_updates_counters_and_rejects_duplicates() {
    let app = spawn_test_app().await;
    load_small_catalog(&app, "alice").await;
    call(&app.app, Method::POST, "/api/session", Some(json!({})), "alice").await;

    let url = problem_url("3sum");
    let (status, body) = post_url(&app, "/api/progress/complete", &url, "alice").await;
    assert_status_ok_json(status, &body);
    let progress = &body["data"]["progress"];
    assert_eq!(progress["global"]["medium"], 1);
    assert_eq!(progress["global"]["total"], 1);
    assert_eq!(progress["session"]["medium"], 1);

    let (status, body) = post_url(&app, "/api/progress/complete", &url, "alice").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_json_error(&body, "ALREADY_COMPLETED");

    let (_, body) = call(&app.app, Method::GET, "/api/progress", None, "alice").await;
    assert_eq!(body["data"]["global"]["total"], 1);
}

#[tokio::test]
async fn it_complete_unknown_problem_is_rejected() {
    let app = spawn_test_app().await;
    load_small_catalog(&app, "alice").await;

    let (status, body) =
        post_url(&app, "/api/progress/complete", "https://example.com/other", "alice").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_json_error(&body, "ALREADY_COMPLETED");

    let (_, body) = call(&app.app, Method::GET, "/api/progress/export", None, "alice").await;
    assert_eq!(body["data"]["completed"], json!([]));
}

#[tokio::test]
async fn it_skip_then_complete_counts_in_session() {
    let app = spawn_test_app().await;
    load_small_catalog(&app, "alice").await;
    let (_, session) = call(&app.app, Method::POST, "/api/session", Some(json!({})), "alice").await;
    assert_eq!(session["data"]["problems"].as_array().unwrap().len(), 4);

    let url = problem_url("two-sum");
    let (status, body) = post_url(&app, "/api/progress/skip", &url, "alice").await;
    assert_status_ok_json(status, &body);
    assert_eq!(body["data"]["replacement"]["difficulty"], "easy");
    assert_eq!(body["data"]["progress"]["skipped"], 1);

    let (status, body) = post_url(&app, "/api/progress/skip", &url, "alice").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_json_error(&body, "SKIP_REJECTED");

    let (status, body) = post_url(&app, "/api/progress/complete", &url, "alice").await;
    assert_status_ok_json(status, &body);
    assert_eq!(body["data"]["progress"]["session"]["easy"], 1);
    assert_eq!(body["data"]["progress"]["skipped"], 0);

    let (_, list) = call(&app.app, Method::GET, "/api/progress/lists/skipped", None, "alice").await;
    assert_eq!(list["data"]["urls"], json!([]));
}

#[tokio::test]
async fn it_skip_completed_problem_is_rejected() {
    let app = spawn_test_app().await;
    load_small_catalog(&app, "alice").await;

    let url = problem_url("word-ladder");
    post_url(&app, "/api/progress/complete", &url, "alice").await;
    let (status, body) = post_url(&app, "/api/progress/skip", &url, "alice").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_json_error(&body, "SKIP_REJECTED");
}

#[tokio::test]
async fn it_revisit_is_idempotent_and_listed() {
    let app = spawn_test_app().await;
    load_small_catalog(&app, "alice").await;

    let url = problem_url("3sum");
    let (status, body) = post_url(&app, "/api/progress/revisit", &url, "alice").await;
    assert_status_ok_json(status, &body);
    assert_eq!(body["data"]["progress"]["revisit"], 1);

    let (status, body) = post_url(&app, "/api/progress/revisit", &url, "alice").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_json_error(&body, "ALREADY_FLAGGED");

    post_url(&app, "/api/progress/skip", &url, "alice").await;
    let (_, list) = call(&app.app, Method::GET, "/api/progress/lists/skipped", None, "alice").await;
    assert_eq!(list["data"]["urls"], json!([{"url": url, "isRevisit": true}]));

    let (_, list) = call(&app.app, Method::GET, "/api/progress/lists/revisit", None, "alice").await;
    assert_eq!(list["data"]["urls"][0]["url"], url);
}

#[tokio::test]
async fn it_completed_query_filters_scope_and_difficulty() {
    let app = spawn_test_app().await;
    load_small_catalog(&app, "alice").await;

    // 会话生成前完成的题只计入全局
    post_url(&app, "/api/progress/complete", &problem_url("word-ladder"), "alice").await;
    call(&app.app, Method::POST, "/api/session", Some(json!({})), "alice").await;
    post_url(&app, "/api/progress/complete", &problem_url("two-sum"), "alice").await;

    let (_, body) = call(
        &app.app,
        Method::GET,
        "/api/progress/completed/global/all",
        None,
        "alice",
    )
    .await;
    assert_eq!(body["data"]["urls"].as_array().unwrap().len(), 2);

    let (_, body) = call(
        &app.app,
        Method::GET,
        "/api/progress/completed/session/all",
        None,
        "alice",
    )
    .await;
    assert_eq!(
        body["data"]["urls"],
        json!([{"url": problem_url("two-sum"), "isRevisit": false}])
    );

    let (_, body) = call(
        &app.app,
        Method::GET,
        "/api/progress/completed/global/hard",
        None,
        "alice",
    )
    .await;
    assert_eq!(body["data"]["urls"][0]["url"], problem_url("word-ladder"));
}

#[tokio::test]
async fn it_invalid_query_parameters_are_rejected() {
    let app = spawn_test_app().await;

    let (status, body) = call(&app.app, Method::GET, "/api/progress/lists/done", None, "alice").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_json_error(&body, "INVALID_PARAMETER");

    let (status, body) = call(
        &app.app,
        Method::GET,
        "/api/progress/completed/week/all",
        None,
        "alice",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_json_error(&body, "INVALID_PARAMETER");

    let (status, body) = call(
        &app.app,
        Method::GET,
        "/api/progress/completed/global/extreme",
        None,
        "alice",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_json_error(&body, "INVALID_PARAMETER");
}

#[tokio::test]
async fn it_export_import_round_trip() {
    let app = spawn_test_app().await;
    load_small_catalog(&app, "alice").await;
    call(&app.app, Method::POST, "/api/session", Some(json!({})), "alice").await;
    post_url(&app, "/api/progress/complete", &problem_url("3sum"), "alice").await;
    post_url(&app, "/api/progress/revisit", &problem_url("two-sum"), "alice").await;

    let (_, exported) = call(&app.app, Method::GET, "/api/progress/export", None, "alice").await;
    let document = exported["data"].clone();
    for key in ["completed", "skipped", "revisit", "global_stats", "current_session"] {
        assert!(document.get(key).is_some(), "missing {key}");
    }

    let (status, body) = call(
        &app.app,
        Method::POST,
        "/api/progress/import",
        Some(document.clone()),
        "bob",
    )
    .await;
    assert_status_ok_json(status, &body);

    let (_, reexported) = call(&app.app, Method::GET, "/api/progress/export", None, "bob").await;
    assert_eq!(reexported["data"], document);
}

#[tokio::test]
async fn it_import_missing_key_leaves_record_unchanged() {
    let app = spawn_test_app().await;
    load_small_catalog(&app, "alice").await;
    post_url(&app, "/api/progress/complete", &problem_url("3sum"), "alice").await;

    let (_, before) = call(&app.app, Method::GET, "/api/progress/export", None, "alice").await;

    let (status, body) = call(
        &app.app,
        Method::POST,
        "/api/progress/import",
        Some(json!({"completed": [], "skipped": [], "revisit": [], "global_stats": {}})),
        "alice",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_json_error(&body, "INVALID_IMPORT");

    let (_, after) = call(&app.app, Method::GET, "/api/progress/export", None, "alice").await;
    assert_eq!(after["data"], before["data"]);
}

#[tokio::test]
async fn it_reset_clears_progress_but_keeps_catalog() {
    let app = spawn_test_app().await;
    let catalog = seed_catalog(app.state.store(), 3, 1, 1);
    call(&app.app, Method::POST, "/api/catalog", Some(catalog), "alice").await;
    call(&app.app, Method::POST, "/api/session", Some(json!({})), "alice").await;
    post_url(&app, "/api/progress/revisit", &problem_url("easy-0"), "alice").await;

    let (status, body) = call(&app.app, Method::POST, "/api/progress/reset", None, "alice").await;
    assert_status_ok_json(status, &body);
    assert_eq!(body["data"]["progress"]["revisit"], 0);
    assert_eq!(body["data"]["progress"]["session"]["totalProblems"], 0);

    let (_, status) = call(&app.app, Method::GET, "/api/catalog/status", None, "alice").await;
    assert_eq!(status["data"]["loaded"], true);
    assert_eq!(status["data"]["hasSession"], false);
}
