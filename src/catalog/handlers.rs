/**
 * Catalog HTTP Handlers
 *
 * CRUD endpoints for authors, branches, books and inventory. Reads are
 * open to any authenticated member; writes are admin-only.
 */
use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::catalog::db::{
    create_author, create_book, create_branch, delete_author_cascade, delete_book_cascade,
    find_author_by_email, find_author_by_id, find_book_by_id, find_book_by_isbn,
    find_branch_by_id, find_branch_by_name, list_books, list_branches, list_inventory_for_branch,
    update_book, upsert_inventory,
};
use crate::catalog::{Author, Book, Branch, BranchInventory};
use crate::error::{AppError, AppResult};
use crate::members::Role;
use crate::middleware::auth::AuthUser;
use crate::server::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAuthorRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub biography: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBranchRequest {
    pub branch_name: String,
    pub location: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookRequest {
    pub title: String,
    pub isbn: String,
    pub genre: String,
    pub min_age: i32,
    pub author_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookRequest {
    pub title: String,
    pub genre: String,
    pub min_age: i32,
    pub is_published: bool,
}

/// Stock distribution: copies of one book assigned to one branch.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributeRequest {
    pub branch_id: Uuid,
    pub book_id: Uuid,
    pub copies: i32,
    #[serde(default = "default_borrowable_days")]
    pub borrowable_days: i32,
}

fn default_borrowable_days() -> i32 {
    7
}

/// POST /api/authors (admin)
pub async fn post_author(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateAuthorRequest>,
) -> AppResult<Json<Author>> {
    user.require_role(Role::Admin)?;

    if find_author_by_email(&state.pool, &request.email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Author with this email".into()));
    }

    let author = create_author(&state.pool, &request.name, &request.email, &request.biography)
        .await?;
    Ok(Json(author))
}

/// DELETE /api/authors/{id} (admin) — ordered cascade.
pub async fn delete_author(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(author_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    user.require_role(Role::Admin)?;

    if !delete_author_cascade(&state.pool, author_id).await? {
        return Err(AppError::AuthorNotFound);
    }
    tracing::info!(%author_id, "Author deleted with cascading books and records");
    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// POST /api/branches (admin)
pub async fn post_branch(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateBranchRequest>,
) -> AppResult<Json<Branch>> {
    user.require_role(Role::Admin)?;

    if find_branch_by_name(&state.pool, &request.branch_name)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Branch".into()));
    }

    let branch = create_branch(&state.pool, &request.branch_name, &request.location).await?;
    Ok(Json(branch))
}

/// GET /api/branches
pub async fn get_branches(State(state): State<AppState>) -> AppResult<Json<Vec<Branch>>> {
    Ok(Json(list_branches(&state.pool).await?))
}

/// GET /api/branches/{id}/inventory
pub async fn get_branch_inventory(
    State(state): State<AppState>,
    Path(branch_id): Path<Uuid>,
) -> AppResult<Json<Vec<BranchInventory>>> {
    Ok(Json(list_inventory_for_branch(&state.pool, branch_id).await?))
}

/// POST /api/books (admin)
pub async fn post_book(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateBookRequest>,
) -> AppResult<Json<Book>> {
    user.require_role(Role::Admin)?;

    if find_author_by_id(&state.pool, request.author_id)
        .await?
        .is_none()
    {
        return Err(AppError::AuthorNotFound);
    }
    if find_book_by_isbn(&state.pool, &request.isbn).await?.is_some() {
        return Err(AppError::Conflict("Book with this ISBN".into()));
    }

    let book = create_book(
        &state.pool,
        &request.title,
        &request.isbn,
        &request.genre,
        request.min_age,
        request.author_id,
    )
    .await?;
    Ok(Json(book))
}

/// GET /api/books
pub async fn get_books(State(state): State<AppState>) -> AppResult<Json<Vec<Book>>> {
    Ok(Json(list_books(&state.pool).await?))
}

/// GET /api/books/{id}
pub async fn get_book(
    State(state): State<AppState>,
    Path(book_id): Path<Uuid>,
) -> AppResult<Json<Book>> {
    let book = find_book_by_id(&state.pool, book_id)
        .await?
        .ok_or(AppError::BookNotFound)?;
    Ok(Json(book))
}

/// PUT /api/books/{id} (admin)
pub async fn put_book(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(book_id): Path<Uuid>,
    Json(request): Json<UpdateBookRequest>,
) -> AppResult<Json<Book>> {
    user.require_role(Role::Admin)?;

    let book = update_book(
        &state.pool,
        book_id,
        &request.title,
        &request.genre,
        request.min_age,
        request.is_published,
    )
    .await?
    .ok_or(AppError::BookNotFound)?;
    Ok(Json(book))
}

/// DELETE /api/books/{id} (admin)
pub async fn delete_book(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(book_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    user.require_role(Role::Admin)?;

    if !delete_book_cascade(&state.pool, book_id).await? {
        return Err(AppError::BookNotFound);
    }
    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// POST /api/inventory (admin)
pub async fn post_inventory(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<DistributeRequest>,
) -> AppResult<Json<BranchInventory>> {
    user.require_role(Role::Admin)?;

    if find_branch_by_id(&state.pool, request.branch_id)
        .await?
        .is_none()
    {
        return Err(AppError::BranchNotFound);
    }
    if find_book_by_id(&state.pool, request.book_id).await?.is_none() {
        return Err(AppError::BookNotFound);
    }

    let inventory = upsert_inventory(
        &state.pool,
        request.branch_id,
        request.book_id,
        request.copies,
        request.borrowable_days,
    )
    .await?;
    Ok(Json(inventory))
}
