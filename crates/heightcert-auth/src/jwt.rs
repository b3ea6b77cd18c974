//! Token creation and verification (HS256).

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use heightcert_config::JwtConfig;
use heightcert_core::{AppError, Role};

use crate::claims::{Claims, RefreshTokenClaims};

fn now_ts() -> usize {
    Utc::now().timestamp().max(0) as usize
}

/// Issues an access token embedding the user's role.
///
/// # Errors
///
/// Fails only if encoding fails, which maps to a 500.
pub fn create_access_token(
    user_id: Uuid,
    email: &str,
    role: Role,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = now_ts();
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role: role.as_str().to_string(),
        exp: now + jwt_config.access_token_expiry.max(0) as usize,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal_error(format!("Failed to create token: {e}")))
}

/// Checks signature and expiry. Any failure is a 401.
pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("Invalid or expired token"))
}

pub fn create_refresh_token(
    user_id: Uuid,
    email: &str,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = now_ts();
    let claims = RefreshTokenClaims {
        sub: user_id.to_string(),
        email: email.to_string(),
        exp: now + jwt_config.refresh_token_expiry.max(0) as usize,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal_error(format!("Failed to create refresh token: {e}")))
}

pub fn verify_refresh_token(
    token: &str,
    jwt_config: &JwtConfig,
) -> Result<RefreshTokenClaims, AppError> {
    decode::<RefreshTokenClaims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("Invalid or expired refresh token"))
}
