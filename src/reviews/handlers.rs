/**
 * Review HTTP Handlers
 *
 * - `POST /api/books/{bookId}/reviews` (member) — post a review
 * - `GET /api/books/{bookId}/reviews` — list a book's reviews
 */
use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::catalog::db::find_book_by_id;
use crate::error::{AppError, AppResult};
use crate::members::Role;
use crate::middleware::auth::AuthUser;
use crate::reviews::db::{find_review, insert_review, list_book_reviews};
use crate::reviews::{validate_rating, Review};
use crate::server::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PostReviewRequest {
    pub review: String,
    pub rating: i32,
}

/// POST /api/books/{bookId}/reviews (member)
pub async fn post_review(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(book_id): Path<Uuid>,
    Json(request): Json<PostReviewRequest>,
) -> AppResult<Json<Review>> {
    user.require_role(Role::Member)?;

    if find_book_by_id(&state.pool, book_id).await?.is_none() {
        return Err(AppError::BookNotFound);
    }

    validate_rating(request.rating)?;

    if find_review(&state.pool, book_id, user.member_id)
        .await?
        .is_some()
    {
        return Err(AppError::AlreadyReviewed);
    }

    let review = insert_review(
        &state.pool,
        book_id,
        user.member_id,
        &request.review,
        request.rating,
    )
    .await?;

    tracing::info!(review_id = %review.id, %book_id, "Review posted");
    Ok(Json(review))
}

/// GET /api/books/{bookId}/reviews
pub async fn get_book_reviews(
    State(state): State<AppState>,
    Path(book_id): Path<Uuid>,
) -> AppResult<Json<Vec<Review>>> {
    if find_book_by_id(&state.pool, book_id).await?.is_none() {
        return Err(AppError::BookNotFound);
    }
    Ok(Json(list_book_reviews(&state.pool, book_id).await?))
}
