/**
 * Submission HTTP Handlers
 *
 * - `POST /api/book-requests` — submit a book on behalf of an author
 * - `GET /api/book-requests` (admin) — list submissions
 * - `PATCH /api/book-requests/{id}/accept` (admin) — publish the book
 * - `PATCH /api/book-requests/{id}/reject` (admin)
 *
 * Accepting runs as one transaction: the guarded status flip, the book
 * insert and the author's approval-time average all commit together.
 */
use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::db::{create_book, find_author_by_id, find_book_by_isbn};
use crate::catalog::Book;
use crate::error::{AppError, AppResult};
use crate::members::Role;
use crate::middleware::auth::AuthUser;
use crate::server::state::AppState;
use crate::submissions::db::{
    accept_request, create_request, find_request, find_request_by_isbn, list_requests,
    reject_request, update_author_approval_average,
};
use crate::submissions::BookRequest;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub author_id: Uuid,
    pub title: String,
    pub isbn: String,
    pub genre: String,
    pub min_age: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptResponse {
    pub request: BookRequest,
    pub book: Book,
    pub average_approval_seconds: f64,
}

/// POST /api/book-requests
pub async fn submit(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Json(request): Json<SubmitRequest>,
) -> AppResult<Json<BookRequest>> {
    if find_author_by_id(&state.pool, request.author_id)
        .await?
        .is_none()
    {
        return Err(AppError::AuthorNotFound);
    }
    if find_request_by_isbn(&state.pool, &request.isbn)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Book request with this ISBN".into()));
    }
    if find_book_by_isbn(&state.pool, &request.isbn).await?.is_some() {
        return Err(AppError::Conflict("Book with this ISBN".into()));
    }

    let saved = create_request(
        &state.pool,
        request.author_id,
        &request.title,
        &request.isbn,
        &request.genre,
        request.min_age,
    )
    .await?;

    tracing::info!(request_id = %saved.id, author_id = %saved.author_id, "Book submitted for approval");

    // Best effort: tell the editorial inbox a submission is waiting.
    let mailer = state.mailer.clone();
    let editorial = std::env::var("CMS_EMAIL").unwrap_or_else(|_| "admin@admin.com".to_string());
    let title = saved.title.clone();
    let isbn = saved.isbn.clone();
    tokio::spawn(async move {
        mailer
            .send_email(
                &editorial,
                &format!("New Book Request: {title}"),
                &format!("A new book request has been submitted for approval. ISBN: {isbn}."),
                Some(&format!(
                    "<p>A new book request has been submitted for approval. <strong>ISBN:</strong> {isbn}.</p>"
                )),
            )
            .await;
    });

    Ok(Json(saved))
}

/// GET /api/book-requests (admin)
pub async fn list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Vec<BookRequest>>> {
    user.require_role(Role::Admin)?;
    Ok(Json(list_requests(&state.pool).await?))
}

/// PATCH /api/book-requests/{id}/accept (admin)
pub async fn accept(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<AcceptResponse>> {
    user.require_role(Role::Admin)?;

    let mut tx = state.pool.begin().await?;

    let Some(accepted) = accept_request(&mut *tx, request_id).await? else {
        tx.rollback().await?;
        return Err(processed_or_missing(&state, request_id).await?);
    };

    let book = create_book(
        &mut *tx,
        &accepted.title,
        &accepted.isbn,
        &accepted.genre,
        accepted.min_age,
        accepted.author_id,
    )
    .await?;

    let average = update_author_approval_average(&mut *tx, accepted.author_id).await?;

    tx.commit().await?;

    tracing::info!(
        request_id = %accepted.id,
        book_id = %book.id,
        "Book request accepted and published"
    );

    Ok(Json(AcceptResponse {
        request: accepted,
        book,
        average_approval_seconds: average,
    }))
}

/// PATCH /api/book-requests/{id}/reject (admin)
pub async fn reject(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<BookRequest>> {
    user.require_role(Role::Admin)?;

    let Some(rejected) = reject_request(&state.pool, request_id).await? else {
        return Err(processed_or_missing(&state, request_id).await?);
    };

    tracing::info!(request_id = %rejected.id, "Book request rejected");
    Ok(Json(rejected))
}

/// A decision update that matched no row means the request is either gone
/// or already decided; look again to report which.
async fn processed_or_missing(state: &AppState, request_id: Uuid) -> AppResult<AppError> {
    Ok(match find_request(&state.pool, request_id).await? {
        Some(_) => AppError::RequestAlreadyProcessed,
        None => AppError::BookRequestNotFound,
    })
}
