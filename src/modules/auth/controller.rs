use axum::{Json, extract::State};
use tracing::instrument;
use utoipa::ToSchema;

use heightcert_core::AppError;

use super::model::{
    LoginRequest, LoginResponse, MeResponse, RefreshTokenRequest, RefreshTokenResponse,
};
use super::service::AuthService;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[derive(ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Login and receive an access and refresh token pair
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Malformed request", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 403, description = "Account disabled", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 429, description = "Too many attempts", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto), fields(user.email = %dto.email))]
pub async fn login_user(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let response = AuthService::login_user(&state.db, dto, &state.jwt_config).await?;
    Ok(Json(response))
}

/// Exchange a refresh token for a new access token
///
/// The new token carries the user's current role, so role changes take
/// effect on the next refresh.
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New access token", body = RefreshTokenResponse),
        (status = 401, description = "Invalid or expired refresh token", body = ErrorResponse),
        (status = 403, description = "Account disabled", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip_all)]
pub async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RefreshTokenRequest>,
) -> Result<Json<RefreshTokenResponse>, AppError> {
    let response =
        AuthService::refresh_access_token(&state.db, &dto.refresh_token, &state.jwt_config)
            .await?;
    Ok(Json(response))
}

/// Current user with the role and permissions the UI should honour
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user profile and permissions", body = MeResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "User no longer exists", body = ErrorResponse)
    ),
    tag = "Authentication",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<MeResponse>, AppError> {
    let response = AuthService::me(&state.db, &auth_user).await?;
    Ok(Json(response))
}
