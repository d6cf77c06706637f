/**
 * Session Management and JWT Tokens
 *
 * This module handles JWT token generation and validation for member
 * sessions. Tokens carry the member id, email and role; role checks happen
 * in the auth middleware and the WebSocket gate.
 */
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::members::Role;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Member ID
    pub sub: String,
    /// Email
    pub email: String,
    /// Role (member or admin)
    pub role: Role,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at time (Unix timestamp)
    pub iat: u64,
}

/// Get JWT secret from environment
fn get_jwt_secret() -> String {
    std::env::var("JWT_SECRET").unwrap_or_else(|err| {
        tracing::warn!("Missing JWT_SECRET ({err}); using development default");
        "your-secret-key-change-in-production".to_string()
    })
}

/// Create a JWT token for a member
///
/// # Arguments
/// * `member_id` - Member ID (UUID)
/// * `email` - Member email
/// * `role` - Member role
///
/// # Returns
/// JWT token string, valid for 30 days
pub fn create_token(
    member_id: uuid::Uuid,
    email: String,
    role: Role,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    // Token expires in 30 days
    let exp = now + (30 * 24 * 60 * 60);

    let claims = Claims {
        sub: member_id.to_string(),
        email,
        role,
        exp,
        iat: now,
    };

    let secret = get_jwt_secret();
    let key = EncodingKey::from_secret(secret.as_ref());

    encode(&Header::default(), &claims, &key)
}

/// Verify and decode a JWT token
///
/// # Arguments
/// * `token` - JWT token string
///
/// # Returns
/// Decoded claims or error
pub fn verify_token(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let secret = get_jwt_secret();
    let key = DecodingKey::from_secret(secret.as_ref());
    let validation = Validation::default();

    let token_data = decode::<Claims>(token, &key, &validation)?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_token() {
        let member_id = uuid::Uuid::new_v4();
        let result = create_token(member_id, "test@example.com".to_string(), Role::Member);
        assert!(result.is_ok());
        assert!(!result.unwrap().is_empty());
    }

    #[test]
    fn test_verify_token_round_trip() {
        let member_id = uuid::Uuid::new_v4();
        let token =
            create_token(member_id, "test@example.com".to_string(), Role::Admin).unwrap();

        let claims = verify_token(&token).unwrap();
        assert_eq!(claims.sub, member_id.to_string());
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.role, Role::Admin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_verify_invalid_token() {
        assert!(verify_token("invalid.token.here").is_err());
    }
}
