use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    Json,
};
use sea_orm::{ActiveModelTrait, Set};
use shelf_authz::AuthUser;
use shelf_http::extract::AppJson;
use shelf_http::AppError;
use shelf_kernel::AppState;
use tracing::instrument;

use super::models::*;
use crate::catalog;
use crate::entity::review;
use crate::modules::books::routes::find_book;
use crate::modules::submitted;

/// Review a book as the requester.
#[instrument(skip(state, auth_user, form), fields(user_id = auth_user.user_id))]
pub async fn create_review(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(book_id): Path<i32>,
    AppJson(form): AppJson<ReviewForm>,
) -> Result<Response, AppError> {
    let book = find_book(&state.db, book_id).await?;
    let valid = form.validate(state.settings.catalog.max_rate)?;

    let model = review::ActiveModel {
        book_id: Set(book.id),
        title: Set(valid.title),
        text: Set(valid.text),
        rate: Set(valid.rate),
        user_id: Set(auth_user.user_id),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    tracing::info!(review_id = model.id, book_id, rate = model.rate, "review created");
    Ok(submitted(
        StatusCode::CREATED,
        format!("/api/books/{book_id}"),
        model,
    ))
}

/// Reviews of one book, newest first.
#[instrument(skip(state, _auth_user))]
pub async fn list_reviews(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(book_id): Path<i32>,
) -> Result<Json<ReviewList>, AppError> {
    find_book(&state.db, book_id).await?;
    let items = catalog::reviews_for(&state.db, book_id).await?;
    let rates: Vec<i32> = items.iter().map(|r| r.rate).collect();

    Ok(Json(ReviewList {
        book_id,
        avg_rating: catalog::average(&rates),
        items,
    }))
}
