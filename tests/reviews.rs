mod common;

use axum::http::StatusCode;
use common::{ids, spawn_app};
use serde_json::json;

#[tokio::test]
async fn any_user_can_review_and_is_sent_back_to_the_book() {
    let app = spawn_app().await;
    let owner = app.login_as("owner").await;
    let reader = app.login_as("reader").await;
    let book = app.create_book(&owner, "Shared").await;

    let response = app.review(&reader, book, 5).await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.location(), format!("/api/books/{book}"));
    assert_eq!(response.body["book_id"], book);
    assert_eq!(response.body["rate"], 5);

    let me = app.get("/api/users/me", Some(&reader)).await;
    assert_eq!(response.body["user_id"], me.body["id"]);
}

#[tokio::test]
async fn rate_must_be_within_scale() {
    let app = spawn_app().await;
    let token = app.login_as("ada").await;
    let book = app.create_book(&token, "Rated").await;

    for rate in [-1, 6] {
        let response = app.review(&token, book, rate).await;
        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY, "rate {rate}");
        assert_eq!(response.body["error"]["details"][0]["field"], "rate");
    }

    assert_eq!(app.review(&token, book, 0).await.status, StatusCode::CREATED);
    assert_eq!(app.review(&token, book, 5).await.status, StatusCode::CREATED);
}

#[tokio::test]
async fn reviewing_a_missing_book_is_404() {
    let app = spawn_app().await;
    let token = app.login_as("ada").await;

    let response = app.review(&token, 7, 3).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"]["code"], "not_found");
}

#[tokio::test]
async fn book_detail_and_review_list_are_newest_first_with_average() {
    let app = spawn_app().await;
    let token = app.login_as("ada").await;
    let book = app.create_book(&token, "Detailed").await;

    let first = app.review(&token, book, 1).await.body["id"].as_i64().unwrap();
    let second = app.review(&token, book, 4).await.body["id"].as_i64().unwrap();

    let detail = app.get(&format!("/api/books/{book}"), Some(&token)).await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.body["avg_rating"], 2.5);
    assert_eq!(detail.body["review_count"], 2);
    assert_eq!(ids(&detail.body["reviews"]), vec![second, first]);

    let list = app.get(&format!("/api/reviews/{book}"), Some(&token)).await;
    assert_eq!(list.status, StatusCode::OK);
    assert_eq!(list.body["avg_rating"], 2.5);
    assert_eq!(ids(&list.body["items"]), vec![second, first]);
}

#[tokio::test]
async fn unreviewed_book_has_null_average() {
    let app = spawn_app().await;
    let token = app.login_as("ada").await;
    let book = app.create_book(&token, "Quiet").await;

    let detail = app.get(&format!("/api/books/{book}"), Some(&token)).await;
    assert!(detail.body["avg_rating"].is_null());
    assert_eq!(detail.body["review_count"], 0);
}

#[tokio::test]
async fn anonymous_review_is_refused() {
    let app = spawn_app().await;
    let token = app.login_as("ada").await;
    let book = app.create_book(&token, "Guarded").await;

    let response = app
        .post(
            &format!("/api/reviews/{book}"),
            None,
            json!({ "title": "Drive-by", "text": "x", "rate": 3 }),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let list = app.get(&format!("/api/reviews/{book}"), Some(&token)).await;
    assert!(list.body["items"].as_array().unwrap().is_empty());
}
