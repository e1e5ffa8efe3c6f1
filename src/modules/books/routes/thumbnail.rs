use anyhow::Context;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Response,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use shelf_authz::{ensure_owner, AuthUser};
use shelf_http::{error::field_error, AppError};
use shelf_kernel::AppState;
use tracing::instrument;

use super::find_book;
use crate::entity::book;
use crate::modules::books::models::BookResponse;
use crate::modules::submitted;
use crate::utils::media;

/// Store an uploaded cover image as the book's thumbnail. Owner only.
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn upload_thumbnail(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let model = find_book(&state.db, id).await?;
    ensure_owner(&auth_user, &model)?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(format!("Multipart error: {e}")))?
    {
        if field.name() != Some("file") {
            continue; // Ignore unknown fields.
        }

        let extension = media::image_extension(field.file_name(), field.content_type())
            .ok_or_else(|| {
                AppError::validation(
                    vec![field_error("file", "must be a png, jpeg, gif or webp image")],
                    "Unsupported thumbnail",
                )
            })?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::bad_request(format!("Multipart error: {e}")))?;
        upload = Some((extension, bytes));
    }

    let (extension, bytes) = upload
        .filter(|(_, bytes)| !bytes.is_empty())
        .ok_or_else(|| {
            AppError::validation(vec![field_error("file", "required")], "Missing thumbnail file")
        })?;

    let media_settings = &state.settings.media;
    let relative = media::store_thumbnail(&media_settings.root, &bytes, extension)
        .await
        .context("failed to store thumbnail")?;

    let previous = model.thumbnail.clone();
    let mut active: book::ActiveModel = model.into();
    active.thumbnail = Set(Some(relative.clone()));
    let updated = match active.update(&state.db).await {
        Ok(updated) => updated,
        Err(e) => {
            if let Err(io) = media::remove_thumbnail(&media_settings.root, &relative).await {
                tracing::warn!(error = %io, path = %relative, "failed to remove orphaned upload");
            }
            return Err(e.into());
        }
    };

    if let Some(old) = previous {
        discard(&state, &old).await;
    }

    tracing::info!(book_id = id, size = bytes.len(), "thumbnail uploaded");
    Ok(submitted(
        StatusCode::OK,
        format!("/api/books/{id}"),
        BookResponse::new(updated, &media_settings.url_prefix),
    ))
}

/// Best-effort removal of a thumbnail this service stored.
///
/// Paths outside the upload directory are left alone, as are files some
/// book still references.
pub(super) async fn discard(state: &AppState, relative: &str) {
    if !media::is_stored_thumbnail(relative) {
        return;
    }

    let references = book::Entity::find()
        .filter(book::Column::Thumbnail.eq(relative))
        .count(&state.db)
        .await;
    match references {
        Ok(0) => {}
        Ok(count) => {
            tracing::debug!(path = relative, count, "thumbnail still referenced; keeping file");
            return;
        }
        Err(e) => {
            tracing::warn!(error = %e, path = relative, "failed to count thumbnail references");
            return;
        }
    }

    if let Err(e) = media::remove_thumbnail(&state.settings.media.root, relative).await {
        tracing::warn!(error = %e, path = relative, "failed to remove old thumbnail");
    }
}
