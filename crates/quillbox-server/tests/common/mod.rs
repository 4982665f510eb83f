#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, Response, StatusCode},
    Router,
};
use sea_orm::DatabaseConnection;
use tower::ServiceExt;

use migration::{Migrator, MigratorTrait};
use quillbox_server::{config::Config, db, router, state::AppState};

pub const TEST_SECRET: &[u8] = b"integration-test-secret";

/// Build the full router against a fresh in-memory database.
pub async fn test_app() -> (Router, DatabaseConnection) {
    let config = Config {
        port: 0,
        database_url: "sqlite::memory:".to_string(),
        auth_secret: TEST_SECRET.to_vec(),
        token_ttl_secs: 3600,
    };

    let db = db::connect(&config.database_url)
        .await
        .expect("In-memory database should open");
    Migrator::up(&db, None).await.expect("Migrations should run");

    let state: Arc<AppState> = AppState::new(config, db.clone());
    (router(state), db)
}

pub async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }

    let request = match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(resp: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).expect("Response body should be JSON")
}

/// First `name=value` pair of the response's `Set-Cookie` header.
pub fn session_cookie(resp: &Response<Body>) -> String {
    resp.headers()
        .get(header::SET_COOKIE)
        .expect("Set-Cookie header should be present")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

pub async fn register(app: &Router, email: &str, password: &str) -> serde_json::Value {
    let resp = request(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(serde_json::json!({
            "email": email,
            "name": "Test User",
            "password": password,
        })),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp).await
}

/// Register a fresh account, log in, and return its session cookie.
pub async fn signup_and_login(app: &Router, email: &str, password: &str) -> String {
    register(app, email, password).await;

    let resp = request(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(serde_json::json!({ "email": email, "password": password })),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    session_cookie(&resp)
}

pub async fn create_note(
    app: &Router,
    cookie: &str,
    title: &str,
    content: &str,
    tag_ids: &[&str],
) -> serde_json::Value {
    let resp = request(
        app,
        "POST",
        "/api/notes",
        Some(cookie),
        Some(serde_json::json!({
            "title": title,
            "content": content,
            "tagIds": tag_ids,
        })),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp).await
}

pub async fn create_tag(app: &Router, cookie: &str, name: &str) -> serde_json::Value {
    let resp = request(
        app,
        "POST",
        "/api/tags",
        Some(cookie),
        Some(serde_json::json!({ "name": name })),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp).await
}
