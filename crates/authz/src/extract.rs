use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{header, request::Parts, HeaderMap},
    response::{IntoResponse, Redirect, Response},
};
use shelf_http::AppError;
use shelf_kernel::AppState;

use crate::token;

/// Authenticated user extracted from the `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require authentication.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub username: String,
}

/// Rejection for requests without a valid token.
///
/// Browsers are sent to the login page with a `next` parameter; API clients
/// get a 401 envelope.
#[derive(Debug)]
pub struct LoginRequired {
    reason: &'static str,
    redirect_to: Option<String>,
}

impl IntoResponse for LoginRequired {
    fn into_response(self) -> Response {
        match self.redirect_to {
            Some(location) => Redirect::to(&location).into_response(),
            None => AppError::unauthorized(self.reason).into_response(),
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = LoginRequired;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let reject = |reason: &'static str| {
            let redirect_to = prefers_html(&parts.headers).then(|| {
                // Nested routers strip their prefix from `parts.uri`
                let next = parts
                    .extensions
                    .get::<OriginalUri>()
                    .map(|original| &original.0)
                    .unwrap_or(&parts.uri)
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or("/");
                login_location(&state.settings.auth.login_path, next)
            });
            LoginRequired {
                reason,
                redirect_to,
            }
        };

        let Some(auth_header) = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
        else {
            return Err(reject("Authentication required"));
        };

        let Some(raw) = auth_header.strip_prefix("Bearer ") else {
            return Err(reject("Invalid authorization scheme"));
        };

        match token::verify(raw.trim(), &state.settings.auth) {
            Ok(claims) => Ok(AuthUser {
                user_id: claims.uid,
                username: claims.sub,
            }),
            Err(e) => {
                tracing::debug!(error = %e, "rejected bearer token");
                Err(reject("Invalid or expired token"))
            }
        }
    }
}

/// True when the client asked for HTML ahead of JSON.
fn prefers_html(headers: &HeaderMap) -> bool {
    let Some(accept) = headers.get(header::ACCEPT).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let position = |needle: &str| accept.find(needle);
    match (position("text/html"), position("application/json")) {
        (Some(html), Some(json)) => html < json,
        (Some(_), None) => true,
        _ => false,
    }
}

fn login_location(login_path: &str, next: &str) -> String {
    format!("{login_path}?next={}", encode_query_value(next))
}

fn encode_query_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
