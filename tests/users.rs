mod common;

use axum::http::StatusCode;
use common::spawn_app;
use serde_json::json;

#[tokio::test]
async fn register_login_and_me() {
    let app = spawn_app().await;
    let token = app.login_as("ada").await;

    let me = app.get("/api/users/me", Some(&token)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["username"], "ada");
    assert!(me.body.get("password_hash").is_none());
}

#[tokio::test]
async fn duplicate_username_conflicts() {
    let app = spawn_app().await;
    app.login_as("ada").await;

    let response = app
        .post(
            "/api/users/register",
            None,
            json!({ "username": "ada", "password": "another password" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["error"]["code"], "conflict");
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = spawn_app().await;
    app.login_as("ada").await;

    let response = app
        .post(
            "/api/users/login",
            None,
            json!({ "username": "ada", "password": "not the password" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let unknown = app
        .post(
            "/api/users/login",
            None,
            json!({ "username": "nobody", "password": "correct horse" }),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_registration_is_rejected() {
    let app = spawn_app().await;

    let short = app
        .post(
            "/api/users/register",
            None,
            json!({ "username": "ada", "password": "short" }),
        )
        .await;
    assert_eq!(short.status, StatusCode::UNPROCESSABLE_ENTITY);

    let not_json = app.post("/api/users/register", None, json!("ada")).await;
    assert_eq!(not_json.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_page_echoes_next() {
    let app = spawn_app().await;

    let response = app
        .get("/api/users/login?next=/api/books/index", None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["next"], "/api/books/index");
}

#[tokio::test]
async fn health_and_openapi_are_public() {
    let app = spawn_app().await;

    assert_eq!(app.get("/healthz", None).await.status, StatusCode::OK);
    assert_eq!(app.get("/api/books/health", None).await.status, StatusCode::OK);

    let docs = app.get("/docs/openapi.json", None).await;
    assert_eq!(docs.status, StatusCode::OK);
    assert!(docs.body["paths"]["/api/books/{id}"].is_object());
    assert!(docs.body["components"]["schemas"]["Review"].is_object());
}
