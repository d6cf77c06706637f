/**
 * Review Store
 *
 * Query functions over the reviews table. The `(book_id, member_id)` pair
 * is unique, backing the one-review-per-book rule at the database level.
 */
use sqlx::PgPool;
use uuid::Uuid;

use crate::reviews::Review;

const REVIEW_COLUMNS: &str = "id, book_id, member_id, review, rating, likes, created_at";

pub async fn insert_review(
    pool: &PgPool,
    book_id: Uuid,
    member_id: Uuid,
    review: &str,
    rating: i32,
) -> Result<Review, sqlx::Error> {
    sqlx::query_as::<_, Review>(&format!(
        r#"
        INSERT INTO reviews (book_id, member_id, review, rating)
        VALUES ($1, $2, $3, $4)
        RETURNING {REVIEW_COLUMNS}
        "#
    ))
    .bind(book_id)
    .bind(member_id)
    .bind(review)
    .bind(rating)
    .fetch_one(pool)
    .await
}

pub async fn find_review(
    pool: &PgPool,
    book_id: Uuid,
    member_id: Uuid,
) -> Result<Option<Review>, sqlx::Error> {
    sqlx::query_as::<_, Review>(&format!(
        "SELECT {REVIEW_COLUMNS} FROM reviews WHERE book_id = $1 AND member_id = $2"
    ))
    .bind(book_id)
    .bind(member_id)
    .fetch_optional(pool)
    .await
}

pub async fn list_book_reviews(pool: &PgPool, book_id: Uuid) -> Result<Vec<Review>, sqlx::Error> {
    sqlx::query_as::<_, Review>(&format!(
        "SELECT {REVIEW_COLUMNS} FROM reviews WHERE book_id = $1 ORDER BY created_at DESC"
    ))
    .bind(book_id)
    .fetch_all(pool)
    .await
}
