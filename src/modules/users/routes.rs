use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, SqlErr};
use serde_json::json;
use shelf_authz::{password, token, AuthUser};
use shelf_http::extract::{AppJson, AppQuery};
use shelf_http::AppError;
use shelf_kernel::AppState;
use tracing::instrument;

use super::models::*;
use crate::entity::user;

/// Create an account.
#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let username = validate_register(&payload)?;
    let password_hash = password::hash_password(&payload.password)?;

    let new_user = user::ActiveModel {
        username: Set(username.clone()),
        password_hash: Set(password_hash),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let model = new_user.insert(&state.db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::conflict(
            vec![json!({"field": "username", "error": "taken"})],
            "Username is already taken",
        ),
        _ => AppError::from(e),
    })?;

    tracing::info!(user_id = model.id, "user registered");
    Ok((StatusCode::CREATED, Json(UserResponse::from(model))))
}

/// Exchange credentials for a bearer token.
#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let invalid = || AppError::unauthorized("Invalid username or password");

    let Some(user) = user::Entity::find()
        .filter(user::Column::Username.eq(payload.username.trim()))
        .one(&state.db)
        .await?
    else {
        password::verify_unknown_user(&payload.password);
        return Err(invalid());
    };

    if !password::verify_password(&payload.password, &user.password_hash)? {
        return Err(invalid());
    }

    let issued = token::issue(user.id, &user.username, &state.settings.auth)?;
    tracing::info!(user_id = user.id, "user logged in");

    Ok(Json(LoginResponse {
        token: issued.token,
        token_type: "Bearer",
        expires_in: issued.expires_in,
    }))
}

/// Where unauthenticated browsers land; describes how to obtain a token.
pub async fn login_page(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<LoginPageQuery>,
) -> Json<serde_json::Value> {
    Json(json!({
        "message": "Log in by POSTing {\"username\", \"password\"} to this URL",
        "login": state.settings.auth.login_path,
        "next": query.next,
    }))
}

/// Current account.
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, AppError> {
    let user = user::Entity::find_by_id(auth_user.user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::not_found("User no longer exists"))?;
    Ok(Json(user.into()))
}
