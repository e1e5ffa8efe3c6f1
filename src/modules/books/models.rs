use serde::{Deserialize, Serialize};
use shelf_http::{error::field_error, AppError};

use crate::catalog::{PageMeta, RankedBook};
use crate::entity::{book, review, Category};
use crate::modules::required_text;
use crate::utils::media;

const TITLE_MAX: usize = 100;
const THUMBNAIL_MAX: usize = 255;

/// Submitted book form (create and update).
#[derive(Debug, Clone, Deserialize)]
pub struct BookForm {
    pub title: String,
    pub text: String,
    pub category: String,
    /// Media-relative image path. On update, absent keeps the current one
    /// and an empty string clears it.
    #[serde(default)]
    pub thumbnail: Option<String>,
}

/// Thumbnail instruction carried by a validated form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThumbnailChange {
    Keep,
    Clear,
    Set(String),
}

/// A book form that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidBook {
    pub title: String,
    pub text: String,
    pub category: Category,
    pub thumbnail: ThumbnailChange,
}

impl BookForm {
    /// Validate the form. `current_thumbnail` is the stored value of the book
    /// being edited; uploaded files may only be referenced by the book that
    /// already holds them.
    pub fn validate(&self, current_thumbnail: Option<&str>) -> Result<ValidBook, AppError> {
        let mut errors = Vec::new();

        let title = required_text("title", &self.title, Some(TITLE_MAX), &mut errors);
        let text = required_text("text", &self.text, None, &mut errors);

        let category = Category::parse(&self.category);
        if category.is_none() {
            errors.push(field_error(
                "category",
                "must be one of: business, life, other",
            ));
        }

        let thumbnail = match self.thumbnail.as_deref().map(str::trim) {
            None => ThumbnailChange::Keep,
            Some("") => ThumbnailChange::Clear,
            Some(path) if path.chars().count() > THUMBNAIL_MAX => {
                errors.push(field_error(
                    "thumbnail",
                    format!("must be at most {THUMBNAIL_MAX} characters"),
                ));
                ThumbnailChange::Keep
            }
            Some(path) if !media::is_safe_relative(path) => {
                errors.push(field_error(
                    "thumbnail",
                    "must be a relative path inside the media directory",
                ));
                ThumbnailChange::Keep
            }
            Some(path)
                if media::is_stored_thumbnail(path) && current_thumbnail != Some(path) =>
            {
                errors.push(field_error(
                    "thumbnail",
                    "uploaded images are set through the thumbnail upload",
                ));
                ThumbnailChange::Keep
            }
            Some(path) => ThumbnailChange::Set(path.to_string()),
        };

        match category {
            Some(category) if errors.is_empty() => Ok(ValidBook {
                title,
                text,
                category,
                thumbnail,
            }),
            _ => Err(AppError::validation(errors, "Invalid book")),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct BookResponse {
    pub id: i32,
    pub title: String,
    pub text: String,
    pub thumbnail: Option<String>,
    pub thumbnail_url: Option<String>,
    pub category: Category,
    pub category_label: &'static str,
    pub user_id: i32,
}

impl BookResponse {
    pub fn new(model: book::Model, media_prefix: &str) -> Self {
        Self {
            thumbnail_url: model
                .thumbnail
                .as_deref()
                .map(|path| media::media_url(media_prefix, path)),
            id: model.id,
            title: model.title,
            text: model.text,
            thumbnail: model.thumbnail,
            category_label: model.category.label(),
            category: model.category,
            user_id: model.user_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RankedBookResponse {
    #[serde(flatten)]
    pub book: BookResponse,
    pub avg_rating: Option<f64>,
    pub review_count: i64,
}

impl RankedBookResponse {
    pub fn new(ranked: RankedBook, media_prefix: &str) -> Self {
        Self {
            book: BookResponse::new(ranked.book, media_prefix),
            avg_rating: ranked.avg_rating,
            review_count: ranked.review_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BookPage<T> {
    pub items: Vec<T>,
    pub page: PageMeta,
}

/// Landing page payload: newest books, the full ranking and one ranking page.
#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub object_list: Vec<BookResponse>,
    pub ranking_list: Vec<RankedBookResponse>,
    pub page_obj: BookPage<RankedBookResponse>,
}

#[derive(Debug, Serialize)]
pub struct BookDetailResponse {
    #[serde(flatten)]
    pub book: BookResponse,
    pub avg_rating: Option<f64>,
    pub review_count: usize,
    pub reviews: Vec<review::Model>,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(title: &str, category: &str, thumbnail: Option<&str>) -> BookForm {
        BookForm {
            title: title.to_string(),
            text: "A long text".to_string(),
            category: category.to_string(),
            thumbnail: thumbnail.map(str::to_string),
        }
    }

    fn details(err: AppError) -> Vec<serde_json::Value> {
        match err {
            AppError::Validation { details, .. } => details,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn valid_form_is_trimmed_and_typed() {
        let valid = form("  Dune ", "life", Some("covers/dune.png"))
            .validate(None)
            .unwrap();
        assert_eq!(valid.title, "Dune");
        assert_eq!(valid.category, Category::Life);
        assert_eq!(
            valid.thumbnail,
            ThumbnailChange::Set("covers/dune.png".to_string())
        );
    }

    #[test]
    fn thumbnail_absent_keeps_and_empty_clears() {
        assert_eq!(
            form("T", "other", None).validate(None).unwrap().thumbnail,
            ThumbnailChange::Keep
        );
        assert_eq!(
            form("T", "other", Some("")).validate(None).unwrap().thumbnail,
            ThumbnailChange::Clear
        );
    }

    #[test]
    fn uploaded_paths_are_only_accepted_from_their_book() {
        let path = "thumbnails/0190b7c2.png";

        let details = details(form("T", "life", Some(path)).validate(None).unwrap_err());
        assert_eq!(details[0]["field"], "thumbnail");

        let valid = form("T", "life", Some(path)).validate(Some(path)).unwrap();
        assert_eq!(valid.thumbnail, ThumbnailChange::Set(path.to_string()));
    }

    #[test]
    fn title_over_one_hundred_chars_is_rejected() {
        let long = "x".repeat(101);
        let details = details(form(&long, "business", None).validate(None).unwrap_err());
        assert_eq!(details[0]["field"], "title");
    }

    #[test]
    fn unknown_category_and_escaping_thumbnail_are_reported_together() {
        let details = details(
            form("T", "fiction", Some("../secret.png"))
                .validate(None)
                .unwrap_err(),
        );
        let fields: Vec<&str> = details
            .iter()
            .filter_map(|d| d["field"].as_str())
            .collect();
        assert_eq!(fields, vec!["category", "thumbnail"]);
    }
}
