use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use courier_api::auth::AppStateInner;
use courier_api::middleware::jwt_secret;
use courier_db::Database;

fn app() -> Router {
    let db = Database::open_in_memory().expect("in-memory db");
    let state = Arc::new(AppStateInner {
        db,
        jwt_secret: jwt_secret(),
    });
    courier_api::router(state)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.expect("infallible");
    let status = response.status();
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn post_json(uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("request")
}

fn post_empty(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("request")
}

/// Register a user through the API and return their bearer token.
async fn register(app: &Router, username: &str) -> String {
    let (status, body) = send(
        app,
        post_json(
            "/auth/register",
            None,
            &json!({
                "username": username,
                "password": "correct horse",
                "first_name": "Test",
                "last_name": "User",
                "phone": "555-0100",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["token"].as_str().expect("token").to_string()
}

async fn create_message(app: &Router, token: &str, to: &str, body: &str) -> i64 {
    let (status, resp) = send(
        app,
        post_json("/messages", Some(token), &json!({ "to_username": to, "body": body })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    resp["message"]["id"].as_i64().expect("message id")
}

#[tokio::test]
async fn register_and_login_round_trip() {
    let app = app();
    register(&app, "alice").await;

    let (status, body) = send(
        &app,
        post_json("/auth/login", None, &json!({ "username": "alice", "password": "correct horse" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
    assert!(body["token"].is_string());

    // Wrong password and unknown user are both 401
    let (status, _) = send(
        &app,
        post_json("/auth/login", None, &json!({ "username": "alice", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        post_json("/auth/login", None, &json!({ "username": "nobody", "password": "whatever" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_rejects_duplicates_and_weak_input() {
    let app = app();
    register(&app, "alice").await;

    let dup = json!({
        "username": "alice",
        "password": "correct horse",
        "first_name": "Other",
        "last_name": "Alice",
        "phone": "555-0199",
    });
    let (status, _) = send(&app, post_json("/auth/register", None, &dup)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let short_password = json!({
        "username": "bob",
        "password": "short",
        "first_name": "Bob",
        "last_name": "User",
        "phone": "555-0101",
    });
    let (status, _) = send(&app, post_json("/auth/register", None, &short_password)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn created_message_has_receipt_shape() {
    let app = app();
    let alice = register(&app, "alice").await;
    register(&app, "bob").await;

    let (status, body) = send(
        &app,
        post_json("/messages", Some(&alice), &json!({ "to_username": "bob", "body": "hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let message = &body["message"];
    assert!(message["id"].is_i64());
    assert_eq!(message["from_username"], "alice");
    assert_eq!(message["to_username"], "bob");
    assert_eq!(message["body"], "hi");
    assert!(message["sent_at"].is_string());
    // A fresh message carries no read timestamp at all
    assert!(message.get("read_at").is_none());
}

#[tokio::test]
async fn message_detail_is_limited_to_the_two_parties() {
    let app = app();
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;
    let carol = register(&app, "carol").await;

    let id = create_message(&app, &alice, "bob", "hi").await;
    let uri = format!("/messages/{id}");

    // Sender sees the full joined detail
    let (status, body) = send(&app, get(&uri, Some(&alice))).await;
    assert_eq!(status, StatusCode::OK);
    let message = &body["message"];
    assert_eq!(message["body"], "hi");
    assert_eq!(message["from_user"]["username"], "alice");
    assert_eq!(message["from_user"]["phone"], "555-0100");
    assert_eq!(message["to_user"]["username"], "bob");
    assert!(message["read_at"].is_null());

    // Recipient too
    let (status, _) = send(&app, get(&uri, Some(&bob))).await;
    assert_eq!(status, StatusCode::OK);

    // A third party gets the same 404 as a missing id
    let (status, _) = send(&app, get(&uri, Some(&carol))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, get("/messages/9999", Some(&alice))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn only_the_recipient_can_mark_read() {
    let app = app();
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;

    let id = create_message(&app, &alice, "bob", "hi").await;
    let uri = format!("/messages/{id}/read");

    // Sender cannot mark their own message read
    let (status, _) = send(&app, post_empty(&uri, Some(&alice))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, post_empty(&uri, Some(&bob))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"]["id"].as_i64(), Some(id));
    let first_read_at = body["message"]["read_at"].as_str().expect("read_at").to_string();

    // Re-marking succeeds but never moves the timestamp
    let (status, body) = send(&app, post_empty(&uri, Some(&bob))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"]["read_at"].as_str(), Some(first_read_at.as_str()));

    // The detail now shows the read timestamp
    let (status, body) = send(&app, get(&format!("/messages/{id}"), Some(&bob))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"]["read_at"].is_string());
}

#[tokio::test]
async fn create_rejects_blank_body_and_unknown_recipient() {
    let app = app();
    let alice = register(&app, "alice").await;

    let (status, _) = send(
        &app,
        post_json("/messages", Some(&alice), &json!({ "to_username": "bob", "body": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        post_json("/messages", Some(&alice), &json!({ "to_username": "nobody", "body": "hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn message_routes_require_a_valid_token() {
    let app = app();
    register(&app, "alice").await;

    let (status, _) = send(&app, get("/messages/1", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, get("/messages/1", Some("garbage"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        post_json("/messages", None, &json!({ "to_username": "alice", "body": "hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, post_empty("/messages/1/read", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
