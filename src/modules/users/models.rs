use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shelf_http::{error::field_error, AppError};

use crate::entity::user;
use crate::modules::required_text;

const USERNAME_MAX: usize = 150;
const PASSWORD_MIN: usize = 8;
const PASSWORD_MAX: usize = 128;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginPageQuery {
    pub next: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
}

/// Validate a registration, returning the trimmed username.
pub fn validate_register(payload: &RegisterRequest) -> Result<String, AppError> {
    let mut errors = Vec::new();
    let username = required_text("username", &payload.username, Some(USERNAME_MAX), &mut errors);

    if username.chars().any(char::is_whitespace) {
        errors.push(field_error("username", "must not contain whitespace"));
    }

    let password_len = payload.password.chars().count();
    if !(PASSWORD_MIN..=PASSWORD_MAX).contains(&password_len) {
        errors.push(field_error(
            "password",
            format!("must be {PASSWORD_MIN}-{PASSWORD_MAX} characters"),
        ));
    }

    if errors.is_empty() {
        Ok(username)
    } else {
        Err(AppError::validation(errors, "Invalid registration"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn accepts_reasonable_credentials() {
        assert_eq!(
            validate_register(&request("  reader ", "long enough")).unwrap(),
            "reader"
        );
    }

    #[test]
    fn rejects_short_password_and_blank_username() {
        match validate_register(&request(" ", "short")) {
            Err(AppError::Validation { details, .. }) => assert_eq!(details.len(), 2),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_whitespace_in_username() {
        assert!(validate_register(&request("two words", "long enough")).is_err());
    }
}
