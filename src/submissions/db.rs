/**
 * Book Request Store
 *
 * Query functions for the submission workflow. The accept and reject
 * updates carry a `status = 'pending'` guard in the statement itself, so
 * a request can be decided exactly once even under concurrent editors.
 */
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::submissions::BookRequest;

const REQUEST_COLUMNS: &str = "id, author_id, title, isbn, genre, min_age, status, \
     requested_at, responded_at, approval_seconds";

pub async fn create_request(
    pool: &PgPool,
    author_id: Uuid,
    title: &str,
    isbn: &str,
    genre: &str,
    min_age: i32,
) -> Result<BookRequest, sqlx::Error> {
    sqlx::query_as::<_, BookRequest>(&format!(
        r#"
        INSERT INTO book_requests (author_id, title, isbn, genre, min_age)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {REQUEST_COLUMNS}
        "#
    ))
    .bind(author_id)
    .bind(title)
    .bind(isbn)
    .bind(genre)
    .bind(min_age)
    .fetch_one(pool)
    .await
}

pub async fn find_request(
    pool: &PgPool,
    request_id: Uuid,
) -> Result<Option<BookRequest>, sqlx::Error> {
    sqlx::query_as::<_, BookRequest>(&format!(
        "SELECT {REQUEST_COLUMNS} FROM book_requests WHERE id = $1"
    ))
    .bind(request_id)
    .fetch_optional(pool)
    .await
}

pub async fn find_request_by_isbn(
    pool: &PgPool,
    isbn: &str,
) -> Result<Option<BookRequest>, sqlx::Error> {
    sqlx::query_as::<_, BookRequest>(&format!(
        "SELECT {REQUEST_COLUMNS} FROM book_requests WHERE isbn = $1"
    ))
    .bind(isbn)
    .fetch_optional(pool)
    .await
}

pub async fn list_requests(pool: &PgPool) -> Result<Vec<BookRequest>, sqlx::Error> {
    sqlx::query_as::<_, BookRequest>(&format!(
        "SELECT {REQUEST_COLUMNS} FROM book_requests ORDER BY requested_at DESC"
    ))
    .fetch_all(pool)
    .await
}

/// Accept a pending request.
///
/// Stamps the response time and the approval duration in one guarded
/// update; `None` means the request was missing or already processed.
pub async fn accept_request<'e>(
    executor: impl PgExecutor<'e>,
    request_id: Uuid,
) -> Result<Option<BookRequest>, sqlx::Error> {
    sqlx::query_as::<_, BookRequest>(&format!(
        r#"
        UPDATE book_requests
        SET status = 'accepted',
            responded_at = NOW(),
            approval_seconds = EXTRACT(EPOCH FROM (NOW() - requested_at))
        WHERE id = $1 AND status = 'pending'
        RETURNING {REQUEST_COLUMNS}
        "#
    ))
    .bind(request_id)
    .fetch_optional(executor)
    .await
}

/// Reject a pending request; same one-shot guard as the accept path.
pub async fn reject_request<'e>(
    executor: impl PgExecutor<'e>,
    request_id: Uuid,
) -> Result<Option<BookRequest>, sqlx::Error> {
    sqlx::query_as::<_, BookRequest>(&format!(
        r#"
        UPDATE book_requests
        SET status = 'rejected', responded_at = NOW()
        WHERE id = $1 AND status = 'pending'
        RETURNING {REQUEST_COLUMNS}
        "#
    ))
    .bind(request_id)
    .fetch_optional(executor)
    .await
}

/// Recompute the author's average approval time over their accepted
/// requests and persist it. Returns the new average.
pub async fn update_author_approval_average<'e>(
    executor: impl PgExecutor<'e>,
    author_id: Uuid,
) -> Result<f64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        UPDATE authors
        SET average_approval_seconds = COALESCE(
            (SELECT AVG(approval_seconds)
             FROM book_requests
             WHERE author_id = $1 AND status = 'accepted'),
            0
        )
        WHERE id = $1
        RETURNING average_approval_seconds
        "#,
    )
    .bind(author_id)
    .fetch_one(executor)
    .await
}
