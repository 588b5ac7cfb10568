use thiserror::Error;

use crate::types::Review;

/// Rejections produced before anything reaches storage.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Incomplete property data")]
    IncompleteProperty { missing: Vec<&'static str> },
    #[error("Incomplete review data")]
    IncompleteReview { missing: Vec<&'static str> },
    #[error("rating must be between {min} and {max} (got {rating})")]
    RatingOutOfRange { rating: f64, min: f64, max: f64 },
}

impl ValidationError {
    /// Names of the fields that were absent or empty, if any.
    pub fn missing_fields(&self) -> &[&'static str] {
        match self {
            Self::IncompleteProperty { missing } | Self::IncompleteReview { missing } => missing,
            Self::RatingOutOfRange { .. } => &[],
        }
    }
}

/// Checks applied to a review before it is appended to a property.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReviewRules {
    /// Accept any review, including one with no fields at all.
    Lenient,
    /// Require `user`, `rating` and `comment`, with the rating inside `min..=max`.
    Strict { rating_min: f64, rating_max: f64 },
}

impl Default for ReviewRules {
    fn default() -> Self {
        Self::Lenient
    }
}

impl ReviewRules {
    pub fn check(&self, review: &Review) -> Result<(), ValidationError> {
        let Self::Strict {
            rating_min,
            rating_max,
        } = *self
        else {
            return Ok(());
        };

        let mut missing = Vec::new();
        if review.user.as_deref().map_or(true, str::is_empty) {
            missing.push("user");
        }
        if review.rating.is_none() {
            missing.push("rating");
        }
        if review.comment.as_deref().map_or(true, str::is_empty) {
            missing.push("comment");
        }
        if !missing.is_empty() {
            return Err(ValidationError::IncompleteReview { missing });
        }

        if let Some(rating) = review.rating.as_ref().and_then(|value| value.as_f64()) {
            if rating < rating_min || rating > rating_max {
                return Err(ValidationError::RatingOutOfRange {
                    rating,
                    min: rating_min,
                    max: rating_max,
                });
            }
        }

        Ok(())
    }
}
