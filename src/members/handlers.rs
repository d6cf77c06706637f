/**
 * Member HTTP Handlers
 *
 * Profile, member listing (admin) and the aggregate return-rate endpoint.
 */
use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::members::db::{average_return_rate, find_member_by_id, list_members};
use crate::members::{MemberView, Role};
use crate::middleware::auth::AuthUser;
use crate::server::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub search: String,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberListResponse {
    pub members: Vec<MemberView>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AverageReturnRateResponse {
    pub average_return_rate: f64,
}

/// GET /api/members/profile
pub async fn profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<MemberView>> {
    let member = find_member_by_id(&state.pool, user.member_id)
        .await?
        .ok_or(AppError::MemberNotFound)?;
    Ok(Json(member.into()))
}

/// GET /api/members?page&limit&search (admin)
pub async fn list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<MemberListResponse>> {
    user.require_role(Role::Admin)?;

    let (members, total) =
        list_members(&state.pool, query.page, query.limit, &query.search).await?;

    Ok(Json(MemberListResponse {
        members: members.into_iter().map(MemberView::from).collect(),
        total,
        page: query.page.max(1),
        limit: query.limit.max(1),
    }))
}

/// GET /api/members/average-return-rate
pub async fn average_rate(
    State(state): State<AppState>,
) -> AppResult<Json<AverageReturnRateResponse>> {
    let average = average_return_rate(&state.pool).await?;
    Ok(Json(AverageReturnRateResponse {
        average_return_rate: average,
    }))
}
