/**
 * Dashboard Handler
 *
 * Admin-only aggregate counters over the catalog and borrow tables.
 */
use axum::{extract::State, response::Json};
use serde::Serialize;
use sqlx::PgPool;

use crate::error::AppResult;
use crate::members::db::average_return_rate;
use crate::members::Role;
use crate::middleware::auth::AuthUser;
use crate::server::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub total_books: i64,
    pub total_members: i64,
    pub active_borrows: i64,
    pub overdue_borrows: i64,
    pub average_return_rate: f64,
}

/// GET /api/dashboard (admin)
pub async fn dashboard(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<DashboardResponse>> {
    user.require_role(Role::Admin)?;

    let pool = &state.pool;
    let total_books = count(pool, "SELECT COUNT(*) FROM books").await?;
    let total_members =
        count(pool, "SELECT COUNT(*) FROM members WHERE role = 'member'").await?;
    let active_borrows =
        count(pool, "SELECT COUNT(*) FROM borrows WHERE returned_at IS NULL").await?;
    let overdue_borrows = count(
        pool,
        "SELECT COUNT(*) FROM borrows WHERE is_overdue AND returned_at IS NULL",
    )
    .await?;
    let average = average_return_rate(pool).await?;

    Ok(Json(DashboardResponse {
        total_books,
        total_members,
        active_borrows,
        overdue_borrows,
        average_return_rate: average,
    }))
}

async fn count(pool: &PgPool, query: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(query).fetch_one(pool).await
}
