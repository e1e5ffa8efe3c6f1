use serde::{Deserialize, Serialize};
use shelf_http::{error::field_error, AppError};

use crate::entity::review;
use crate::modules::required_text;

const TITLE_MAX: usize = 100;

/// Submitted review form. The book comes from the path, the author from the token.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewForm {
    pub title: String,
    pub text: String,
    pub rate: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidReview {
    pub title: String,
    pub text: String,
    pub rate: i32,
}

impl ReviewForm {
    /// Validate against the configured rating scale `0..=max_rate`.
    pub fn validate(&self, max_rate: i32) -> Result<ValidReview, AppError> {
        let mut errors = Vec::new();

        let title = required_text("title", &self.title, Some(TITLE_MAX), &mut errors);
        let text = required_text("text", &self.text, None, &mut errors);

        let rate = i32::try_from(self.rate)
            .ok()
            .filter(|rate| (0..=max_rate).contains(rate));
        if rate.is_none() {
            errors.push(field_error(
                "rate",
                format!("must be between 0 and {max_rate}"),
            ));
        }

        match rate {
            Some(rate) if errors.is_empty() => Ok(ValidReview { title, text, rate }),
            _ => Err(AppError::validation(errors, "Invalid review")),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReviewList {
    pub book_id: i32,
    pub avg_rating: Option<f64>,
    pub items: Vec<review::Model>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(rate: i64) -> ReviewForm {
        ReviewForm {
            title: "Great".to_string(),
            text: "Loved it".to_string(),
            rate,
        }
    }

    #[test]
    fn rate_bounds_are_inclusive() {
        assert_eq!(form(0).validate(5).unwrap().rate, 0);
        assert_eq!(form(5).validate(5).unwrap().rate, 5);
    }

    #[test]
    fn rate_outside_scale_is_rejected() {
        for rate in [-1, 6, i64::from(i32::MAX) + 1] {
            match form(rate).validate(5).unwrap_err() {
                AppError::Validation { details, .. } => assert_eq!(details[0]["field"], "rate"),
                other => panic!("expected validation error, got {other:?}"),
            }
        }
    }

    #[test]
    fn max_rate_is_configurable() {
        assert!(form(10).validate(10).is_ok());
        assert!(form(10).validate(5).is_err());
    }

    #[test]
    fn blank_title_is_required() {
        let mut form = form(3);
        form.title = "   ".to_string();
        match form.validate(5).unwrap_err() {
            AppError::Validation { details, .. } => {
                assert_eq!(details[0]["field"], "title");
                assert_eq!(details[0]["error"], "required");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
