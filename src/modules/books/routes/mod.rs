mod thumbnail;

pub use thumbnail::upload_thumbnail;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    Json,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use shelf_authz::{ensure_owner, AuthUser};
use shelf_http::extract::{AppJson, AppQuery};
use shelf_http::AppError;
use shelf_kernel::AppState;
use tracing::instrument;

use super::models::*;
use crate::catalog::{self, Paginator};
use crate::entity::{book, review};
use crate::modules::submitted;

/// Load a book or fail with 404.
pub(crate) async fn find_book<C: ConnectionTrait>(db: &C, id: i32) -> Result<book::Model, AppError> {
    book::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Book {id} not found")))
}

/// Landing page: newest books, the ranking, and the requested ranking page.
#[instrument(skip(state, _auth_user, query))]
pub async fn index(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<Json<IndexResponse>, AppError> {
    let prefix = state.settings.media.url_prefix.as_str();

    let newest = catalog::newest(&state.db).await?;
    let ranking = catalog::ranking(&state.db).await?;

    let page = Paginator::new(ranking.len() as u64, state.settings.catalog.items_per_page)
        .page(query.page.unwrap_or(1))?;

    let items = page
        .slice(&ranking)
        .iter()
        .cloned()
        .map(|ranked| RankedBookResponse::new(ranked, prefix))
        .collect();

    Ok(Json(IndexResponse {
        object_list: newest
            .into_iter()
            .map(|book| BookResponse::new(book, prefix))
            .collect(),
        ranking_list: ranking
            .into_iter()
            .map(|ranked| RankedBookResponse::new(ranked, prefix))
            .collect(),
        page_obj: BookPage {
            items,
            page: page.meta(),
        },
    }))
}

/// Paginated list of every book in insertion order.
#[instrument(skip(state, _auth_user, query))]
pub async fn list_books(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<Json<BookPage<BookResponse>>, AppError> {
    let prefix = state.settings.media.url_prefix.as_str();

    let total = book::Entity::find().count(&state.db).await?;
    let page = Paginator::new(total, state.settings.catalog.items_per_page)
        .page(query.page.unwrap_or(1))?;

    let books = book::Entity::find()
        .order_by_asc(book::Column::Id)
        .offset(page.offset())
        .limit(page.per_page)
        .all(&state.db)
        .await?;

    Ok(Json(BookPage {
        items: books
            .into_iter()
            .map(|book| BookResponse::new(book, prefix))
            .collect(),
        page: page.meta(),
    }))
}

/// Register a book owned by the requester.
#[instrument(skip(state, auth_user, form), fields(user_id = auth_user.user_id))]
pub async fn create_book(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(form): AppJson<BookForm>,
) -> Result<Response, AppError> {
    let valid = form.validate(None)?;
    let thumbnail = match valid.thumbnail {
        ThumbnailChange::Set(path) => Some(path),
        ThumbnailChange::Keep | ThumbnailChange::Clear => None,
    };

    let model = book::ActiveModel {
        title: Set(valid.title),
        text: Set(valid.text),
        thumbnail: Set(thumbnail),
        category: Set(valid.category),
        user_id: Set(auth_user.user_id),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    tracing::info!(book_id = model.id, "book created");
    Ok(submitted(
        StatusCode::CREATED,
        "/api/books/index".to_string(),
        BookResponse::new(model, &state.settings.media.url_prefix),
    ))
}

/// One book with its reviews and rating.
#[instrument(skip(state, _auth_user))]
pub async fn get_book(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<BookDetailResponse>, AppError> {
    let model = find_book(&state.db, id).await?;
    let reviews = catalog::reviews_for(&state.db, id).await?;
    let rates: Vec<i32> = reviews.iter().map(|r| r.rate).collect();

    Ok(Json(BookDetailResponse {
        book: BookResponse::new(model, &state.settings.media.url_prefix),
        avg_rating: catalog::average(&rates),
        review_count: reviews.len(),
        reviews,
    }))
}

/// Replace a book's fields. Owner only.
#[instrument(skip(state, auth_user, form), fields(user_id = auth_user.user_id))]
pub async fn update_book(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(form): AppJson<BookForm>,
) -> Result<Response, AppError> {
    let model = find_book(&state.db, id).await?;
    ensure_owner(&auth_user, &model)?;
    let valid = form.validate(model.thumbnail.as_deref())?;

    let previous_thumbnail = model.thumbnail.clone();
    let mut active: book::ActiveModel = model.into();
    active.title = Set(valid.title);
    active.text = Set(valid.text);
    active.category = Set(valid.category);
    match valid.thumbnail {
        ThumbnailChange::Keep => {}
        ThumbnailChange::Clear => active.thumbnail = Set(None),
        ThumbnailChange::Set(path) => active.thumbnail = Set(Some(path)),
    }

    let updated = active.update(&state.db).await?;

    if let Some(old) = previous_thumbnail {
        if updated.thumbnail.as_deref() != Some(old.as_str()) {
            thumbnail::discard(&state, &old).await;
        }
    }

    tracing::info!(book_id = id, "book updated");
    Ok(submitted(
        StatusCode::OK,
        format!("/api/books/{id}"),
        BookResponse::new(updated, &state.settings.media.url_prefix),
    ))
}

/// Delete a book and its reviews. Owner only.
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_book(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let txn = state.db.begin().await?;

    let model = find_book(&txn, id).await?;
    ensure_owner(&auth_user, &model)?;

    let reviews_removed = review::Entity::delete_many()
        .filter(review::Column::BookId.eq(id))
        .exec(&txn)
        .await?
        .rows_affected;
    book::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;

    if let Some(old) = model.thumbnail {
        thumbnail::discard(&state, &old).await;
    }

    tracing::info!(book_id = id, reviews_removed, "book deleted");
    Ok(submitted(
        StatusCode::OK,
        "/api/books".to_string(),
        DeletedResponse { deleted: id },
    ))
}
