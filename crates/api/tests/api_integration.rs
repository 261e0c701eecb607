//! API integration tests.
//!
//! These tests drive the full router against a mock database.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
    response::Response,
};
use chrono::Utc;
use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult, RuntimeErr, Value};
use serde_json::{Value as Json, json};
use tally_api::{AppState, router as api_router};
use tally_common::config::{
    AdminConfig, Config, DatabaseConfig, SchedulerSettings, ServerConfig,
};
use tally_db::entities::{
    blog_post,
    voting::{self, VotingStatus, VotingType},
    voting_option, voting_response,
};
use tower::ServiceExt;

const ADMIN_TOKEN: &str = "operator-secret";

/// Create a test configuration.
fn create_test_config(admin_token: Option<&str>) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            url: "https://example.com".to_string(),
        },
        database: DatabaseConfig {
            url: "postgres://localhost/test".to_string(),
            max_connections: 10,
            min_connections: 1,
        },
        scheduler: SchedulerSettings::default(),
        admin: AdminConfig {
            token: admin_token.map(ToString::to_string),
        },
    }
}

/// Create a router over the given mock database.
fn create_test_router(db: MockDatabase, admin_token: Option<&str>) -> Router {
    let db = Arc::new(db.into_connection());
    let state = AppState::new(db, &create_test_config(admin_token)).unwrap();
    api_router().with_state(state)
}

fn empty_db() -> MockDatabase {
    MockDatabase::new(DatabaseBackend::Postgres)
}

fn voting(status: VotingStatus) -> voting::Model {
    voting::Model {
        id: "v1".to_string(),
        title: "Favourite release name".to_string(),
        description: None,
        slug: "release-name".to_string(),
        status,
        voting_type: VotingType::Single,
        max_selections: None,
        start_date: None,
        end_date: None,
        show_results: true,
        require_login: false,
        allow_anonymous: true,
        total_votes: 4,
        created_at: Utc::now().into(),
        updated_at: None,
        published_at: None,
    }
}

fn option(id: &str, order: i32, vote_count: i32) -> voting_option::Model {
    voting_option::Model {
        id: id.to_string(),
        voting_id: "v1".to_string(),
        option_text: id.to_string(),
        display_order: order,
        image_url: None,
        vote_count,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

fn voting_response_row(option_id: &str, who: &str) -> voting_response::Model {
    voting_response::Model {
        id: format!("r-{option_id}"),
        voting_id: "v1".to_string(),
        option_id: option_id.to_string(),
        submission_id: "s1".to_string(),
        user_id: None,
        user_identifier: who.to_string(),
        user_email: None,
        user_name: None,
        voted_at: Utc::now().into(),
        metadata: json!({}),
    }
}

fn count_row(n: i64) -> BTreeMap<&'static str, Value> {
    maplit::btreemap! { "num_items" => Value::BigInt(Some(n)) }
}

fn exec_ok(rows: u64) -> MockExecResult {
    MockExecResult {
        last_insert_id: 0,
        rows_affected: rows,
    }
}

fn post_json(uri: &str, body: &Json) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("GET")
        .body(Body::empty())
        .unwrap()
}

fn with_bearer(mut req: Request<Body>, token: &str) -> Request<Body> {
    req.headers_mut()
        .insert("Authorization", format!("Bearer {token}").parse().unwrap());
    req
}

async fn body_json(response: Response) -> Json {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_meta_endpoint() {
    let app = create_test_router(empty_db(), None);

    let response = app.oneshot(get("/meta")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["name"], "tally");
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let app = create_test_router(empty_db(), None);

    let response = app.oneshot(get("/nonexistent")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_submit_without_required_fields() {
    let app = create_test_router(empty_db(), None);

    let response = app
        .oneshot(post_json(
            "/votings/submit",
            &json!({ "voting_id": "v1", "option_ids": ["optA"] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Missing required fields");
}

#[tokio::test]
async fn test_submit_unknown_voting() {
    let db = empty_db().append_query_results([Vec::<voting::Model>::new()]);
    let app = create_test_router(db, None);

    let response = app
        .oneshot(post_json(
            "/votings/submit",
            &json!({ "voting_id": "missing", "option_ids": ["optA"], "user_identifier": "user_x" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Voting not found");
}

#[tokio::test]
async fn test_submit_vote_accepted() {
    let db = empty_db()
        .append_query_results([[voting(VotingStatus::Active)]])
        .append_query_results([[count_row(0)]])
        .append_query_results([[option("optA", 1, 0), option("optB", 2, 0)]])
        .append_exec_results([exec_ok(1), exec_ok(1), exec_ok(1), exec_ok(1)]);
    let app = create_test_router(db, None);

    let mut request = post_json(
        "/votings/submit",
        &json!({ "voting_id": "v1", "option_ids": ["optA"], "user_identifier": "user_x" }),
    );
    request
        .headers_mut()
        .insert("User-Agent", "Mozilla/5.0".parse().unwrap());

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body, json!({ "success": true, "message": "Vote submitted successfully" }));
}

#[tokio::test]
async fn test_submit_duplicate_vote() {
    let db = empty_db()
        .append_query_results([[voting(VotingStatus::Active)]])
        .append_query_results([[count_row(1)]])
        .append_query_results([[option("optA", 1, 0), option("optB", 2, 0)]]);
    let app = create_test_router(db, None);

    let response = app
        .oneshot(post_json(
            "/votings/submit",
            &json!({ "voting_id": "v1", "option_ids": ["optB"], "user_identifier": "user_x" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Anda sudah pernah vote sebelumnya");
    assert_eq!(body["code"], "DUPLICATE_VOTE");
}

#[tokio::test]
async fn test_submit_to_closed_voting() {
    let db = empty_db()
        .append_query_results([[voting(VotingStatus::Closed)]])
        .append_query_results([[count_row(0)]])
        .append_query_results([[option("optA", 1, 0), option("optB", 2, 0)]]);
    let app = create_test_router(db, None);

    let response = app
        .oneshot(post_json(
            "/votings/submit",
            &json!({ "voting_id": "v1", "option_ids": ["optA"], "user_identifier": "user_x" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Voting is not active");
}

#[tokio::test]
async fn test_submit_storage_failure_hides_detail() {
    let db = empty_db().append_query_errors([DbErr::Conn(RuntimeErr::Internal(
        "connection refused".to_string(),
    ))]);
    let app = create_test_router(db, None);

    let response = app
        .oneshot(post_json(
            "/votings/submit",
            &json!({ "voting_id": "v1", "option_ids": ["optA"], "user_identifier": "user_x" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Failed to submit vote");
}

#[tokio::test]
async fn test_results_endpoint() {
    let db = empty_db()
        .append_query_results([[voting(VotingStatus::Active)]])
        .append_query_results([[option("optA", 1, 3), option("optB", 2, 1)]]);
    let app = create_test_router(db, None);

    let response = app
        .oneshot(get("/votings/results?voting_id=v1"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total_votes"], 4);
    assert_eq!(body["results_visible"], true);
    assert_eq!(body["user_voted"], false);
    assert_eq!(body["options"][0]["id"], "optA");
    assert_eq!(body["options"][0]["percentage"], 75);
    assert_eq!(body["options"][1]["percentage"], 25);
}

#[tokio::test]
async fn test_results_for_unknown_voting() {
    let db = empty_db().append_query_results([Vec::<voting::Model>::new()]);
    let app = create_test_router(db, None);

    let response = app
        .oneshot(get("/votings/results?voting_id=missing"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_results_for_draft_voting() {
    let db = empty_db().append_query_results([[voting(VotingStatus::Draft)]]);
    let app = create_test_router(db, None);

    let response = app
        .oneshot(get("/votings/results?voting_id=v1"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Voting not found");
}

#[tokio::test]
async fn test_results_withheld_while_open() {
    let mut hidden = voting(VotingStatus::Active);
    hidden.show_results = false;

    let db = empty_db()
        .append_query_results([[hidden]])
        .append_query_results([[option("optA", 1, 3), option("optB", 2, 1)]])
        .append_query_results([[voting_response_row("optA", "user_abc")]]);
    let app = create_test_router(db, None);

    let response = app
        .oneshot(get("/votings/results?voting_id=v1&user_identifier=user_abc"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["results_visible"], false);
    assert_eq!(body["total_votes"], 0);
    assert_eq!(body["voting"]["total_votes"], 0);
    assert_eq!(body["options"][0]["vote_count"], 0);
    assert_eq!(body["options"][0]["percentage"], 0);
    assert_eq!(body["user_voted"], true);
    assert_eq!(body["user_choices"], json!(["optA"]));
}

#[tokio::test]
async fn test_draft_voting_is_hidden() {
    let db = empty_db().append_query_results([[voting(VotingStatus::Draft)]]);
    let app = create_test_router(db, None);

    let response = app.oneshot(get("/votings/release-name")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_identity_endpoint() {
    let app = create_test_router(empty_db(), None);

    let signals = json!({
        "user_agent": "Mozilla/5.0 (X11; Linux x86_64) Firefox/128.0",
        "language": "id-ID",
        "platform": "Linux x86_64",
        "screen_width": 1920,
        "screen_height": 1080
    });

    let first = body_json(
        app.clone()
            .oneshot(post_json("/identity", &signals))
            .await
            .unwrap(),
    )
    .await;
    let second = body_json(app.oneshot(post_json("/identity", &signals)).await.unwrap()).await;

    let identifier = first["user_identifier"].as_str().unwrap();
    assert!(identifier.starts_with("user_"));
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_admin_endpoint_refused_without_configured_token() {
    let app = create_test_router(empty_db(), None);

    let request = with_bearer(post_json("/blog/publish-scheduled", &json!({})), "anything");
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_endpoint_requires_matching_token() {
    let app = create_test_router(empty_db(), Some(ADMIN_TOKEN));

    let response = app
        .clone()
        .oneshot(post_json("/blog/publish-scheduled", &json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = with_bearer(post_json("/blog/publish-scheduled", &json!({})), "wrong");
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_publish_scheduled_with_nothing_due() {
    let db = empty_db().append_query_results([Vec::<blog_post::Model>::new()]);
    let app = create_test_router(db, Some(ADMIN_TOKEN));

    let request = with_bearer(post_json("/blog/publish-scheduled", &json!({})), ADMIN_TOKEN);
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["published"], 0);
    assert_eq!(body["message"], "No posts to publish");
    assert!(body.get("posts").is_none());
}

#[tokio::test]
async fn test_publish_scheduled_failure_body() {
    let db = empty_db().append_query_errors([DbErr::Conn(RuntimeErr::Internal(
        "connection refused".to_string(),
    ))]);
    let app = create_test_router(db, Some(ADMIN_TOKEN));

    let request = with_bearer(post_json("/blog/publish-scheduled", &json!({})), ADMIN_TOKEN);
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Internal server error");
}

#[tokio::test]
async fn test_create_voting_rejects_invalid_slug() {
    let app = create_test_router(empty_db(), Some(ADMIN_TOKEN));

    let request = with_bearer(
        post_json(
            "/votings",
            &json!({
                "title": "Team lunch",
                "slug": "Team Lunch!",
                "options": [{ "option_text": "Pizza" }, { "option_text": "Sushi" }]
            }),
        ),
        ADMIN_TOKEN,
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
}
