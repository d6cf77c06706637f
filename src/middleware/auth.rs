/**
 * Authentication Middleware
 *
 * This module provides middleware for protecting routes that require an
 * authenticated member. It extracts and verifies JWT tokens from the
 * Authorization header and attaches the identity to the request.
 */
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::sessions::verify_token;
use crate::error::{AppError, AppResult};
use crate::members::Role;
use crate::server::state::AppState;

/// Authenticated member identity extracted from a JWT token.
///
/// The core trusts this identity; credentials are not re-validated per
/// request beyond the signature and expiry check.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub member_id: Uuid,
    pub email: String,
    pub role: Role,
}

impl AuthenticatedUser {
    /// Fail with `Forbidden` unless the identity carries the given role.
    pub fn require_role(&self, role: Role) -> AppResult<()> {
        if self.role == role {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

/// Authentication middleware
///
/// 1. Extracts the Bearer token from the Authorization header
/// 2. Verifies the token signature and expiry
/// 3. Attaches the identity to request extensions for handlers
///
/// Returns 401 Unauthorized if the token is missing or invalid.
pub async fn auth_middleware(
    State(_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            tracing::warn!("Missing Authorization header");
            AppError::Unauthenticated
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        tracing::warn!("Invalid Authorization header format");
        AppError::Unauthenticated
    })?;

    let user = authenticate_token(token)?;
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Verify a raw token and build the request identity.
///
/// Shared with the WebSocket gate, which receives its token as a query
/// parameter instead of a header.
pub fn authenticate_token(token: &str) -> AppResult<AuthenticatedUser> {
    let claims = verify_token(token).map_err(|e| {
        tracing::warn!("Invalid token: {e:?}");
        AppError::Unauthenticated
    })?;

    let member_id = Uuid::parse_str(&claims.sub).map_err(|e| {
        tracing::warn!("Invalid member id in token: {e:?}");
        AppError::Unauthenticated
    })?;

    Ok(AuthenticatedUser {
        member_id,
        email: claims.email,
        role: claims.role,
    })
}

/// Axum extractor for the authenticated member.
///
/// Handlers take `AuthUser(user)` as a parameter; the middleware must have
/// run for the extraction to succeed.
#[derive(Clone, Debug)]
pub struct AuthUser(pub AuthenticatedUser);

impl axum::extract::FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| {
                tracing::warn!("AuthenticatedUser not found in request extensions");
                AppError::Unauthenticated
            })?;

        Ok(AuthUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::sessions::create_token;
    use assert_matches::assert_matches;

    #[test]
    fn test_authenticate_valid_token() {
        let member_id = Uuid::new_v4();
        let token = create_token(member_id, "test@example.com".into(), Role::Member).unwrap();

        let user = authenticate_token(&token).unwrap();
        assert_eq!(user.member_id, member_id);
        assert_eq!(user.role, Role::Member);
    }

    #[test]
    fn test_authenticate_garbage_token() {
        assert_matches!(
            authenticate_token("not-a-token"),
            Err(AppError::Unauthenticated)
        );
    }

    #[test]
    fn test_require_role() {
        let user = AuthenticatedUser {
            member_id: Uuid::new_v4(),
            email: "m@example.com".into(),
            role: Role::Member,
        };
        assert!(user.require_role(Role::Member).is_ok());
        assert_matches!(user.require_role(Role::Admin), Err(AppError::Forbidden));
    }
}
