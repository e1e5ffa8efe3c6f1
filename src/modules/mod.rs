pub mod books;
pub mod reviews;
pub mod users;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shelf_kernel::ModuleRegistry;

/// Register all project-specific modules with the registry
///
/// Order matters: later modules' migrations reference earlier modules' tables.
pub fn register_all(registry: &mut ModuleRegistry) {
    registry.register_custom(users::create_module());
    registry.register_custom(books::create_module());
    registry.register_custom(reviews::create_module());
}

/// Successful form submission: the resulting record plus where to go next.
pub(crate) fn submitted<T: Serialize>(status: StatusCode, location: String, body: T) -> Response {
    (status, [(header::LOCATION, location)], Json(body)).into_response()
}

/// Trimmed, length-checked text field; pushes a detail on failure.
pub(crate) fn required_text(
    field: &str,
    value: &str,
    max_chars: Option<usize>,
    errors: &mut Vec<serde_json::Value>,
) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.push(shelf_http::error::field_error(field, "required"));
    } else if let Some(max) = max_chars {
        if value.chars().count() > max {
            errors.push(shelf_http::error::field_error(
                field,
                format!("must be at most {max} characters"),
            ));
        }
    }
    value.to_string()
}
