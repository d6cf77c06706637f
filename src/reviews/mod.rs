//! Member reviews of books.
//!
//! One review per member per book, with a whole-star rating from 1 to 5.
//! Reviews are immutable once posted.

pub mod db;
pub mod handlers;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub book_id: Uuid,
    pub member_id: Uuid,
    pub review: String,
    pub rating: i32,
    pub likes: i32,
    pub created_at: DateTime<Utc>,
}

/// Ratings are whole stars, 1 through 5 inclusive.
pub fn validate_rating(rating: i32) -> AppResult<()> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(AppError::InvalidRating)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_ratings_within_bounds_pass() {
        for rating in 1..=5 {
            assert!(validate_rating(rating).is_ok());
        }
    }

    #[test]
    fn test_out_of_bounds_ratings_fail() {
        assert_matches!(validate_rating(0), Err(AppError::InvalidRating));
        assert_matches!(validate_rating(6), Err(AppError::InvalidRating));
        assert_matches!(validate_rating(-3), Err(AppError::InvalidRating));
    }
}
