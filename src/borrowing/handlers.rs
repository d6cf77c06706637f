/**
 * Borrowing HTTP Handlers
 *
 * The transport surface over the engine and the sweeper:
 * - `POST /api/borrow/{branchInventoryId}` (member)
 * - `PATCH /api/return/{borrowId}` (member)
 * - `POST /api/borrow/run-overdue-sweep` (admin)
 */
use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::borrowing::engine::{borrow_book, return_book};
use crate::borrowing::sweeper::{run_overdue_sweep, SweepSummary};
use crate::borrowing::BorrowRecord;
use crate::error::AppResult;
use crate::members::Role;
use crate::middleware::auth::AuthUser;
use crate::server::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReturnRequest {
    #[serde(default)]
    pub feedback: String,
}

/// POST /api/borrow/{branchInventoryId}
pub async fn borrow(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(branch_inventory_id): Path<Uuid>,
) -> AppResult<Json<BorrowRecord>> {
    user.require_role(Role::Member)?;

    let record = borrow_book(
        &state.pool,
        &state.mailer,
        branch_inventory_id,
        user.member_id,
    )
    .await?;

    Ok(Json(record))
}

/// PATCH /api/return/{borrowId}
pub async fn return_borrowed(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(borrow_id): Path<Uuid>,
    Json(request): Json<ReturnRequest>,
) -> AppResult<Json<BorrowRecord>> {
    user.require_role(Role::Member)?;

    let record = return_book(&state.pool, borrow_id, &request.feedback).await?;
    Ok(Json(record))
}

/// POST /api/borrow/run-overdue-sweep
pub async fn run_sweep(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<SweepSummary>> {
    user.require_role(Role::Admin)?;

    let summary = run_overdue_sweep(&state.pool, &state.sweep_guard).await?;
    Ok(Json(summary))
}
