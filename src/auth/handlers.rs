/**
 * Authentication Handlers
 *
 * Signup, login and current-member endpoints. Passwords are hashed with
 * bcrypt; successful signup and login return a JWT token plus the member
 * shape without sensitive fields.
 */
use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::auth::sessions::create_token;
use crate::error::{AppError, AppResult};
use crate::members::db::{create_member, find_member_by_email, find_member_by_id};
use crate::members::MemberView;
use crate::middleware::auth::AuthUser;

/// Sign up request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub age: i32,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Returned by signup and login: a token plus the member it identifies.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub member: MemberView,
}

/// POST /api/auth/signup
pub async fn signup(
    State(pool): State<PgPool>,
    Json(request): Json<SignupRequest>,
) -> AppResult<Json<AuthResponse>> {
    if find_member_by_email(&pool, &request.email).await?.is_some() {
        return Err(AppError::Conflict("Email".into()));
    }

    let password_hash = bcrypt::hash(&request.password, bcrypt::DEFAULT_COST)?;
    let member = create_member(
        &pool,
        &request.name,
        &request.email,
        &password_hash,
        request.age,
    )
    .await?;

    tracing::info!(member_id = %member.id, "New member signed up");

    let token = create_token(member.id, member.email.clone(), member.role())?;
    Ok(Json(AuthResponse {
        token,
        member: member.into(),
    }))
}

/// POST /api/auth/login
///
/// Unknown email and wrong password both return 401 so the response does
/// not leak which one was wrong.
pub async fn login(
    State(pool): State<PgPool>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let member = find_member_by_email(&pool, &request.email)
        .await?
        .ok_or(AppError::Unauthenticated)?;

    let valid = bcrypt::verify(&request.password, &member.password_hash)?;
    if !valid {
        tracing::warn!("Failed login attempt for {}", request.email);
        return Err(AppError::Unauthenticated);
    }

    let token = create_token(member.id, member.email.clone(), member.role())?;
    Ok(Json(AuthResponse {
        token,
        member: member.into(),
    }))
}

/// GET /api/auth/me
pub async fn me(
    State(pool): State<PgPool>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<MemberView>> {
    let member = find_member_by_id(&pool, user.member_id)
        .await?
        .ok_or(AppError::MemberNotFound)?;

    Ok(Json(member.into()))
}
