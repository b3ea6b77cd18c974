//! Login, token refresh and the caller's effective permissions.

use heightcert_core::{Permission, Role};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::users::User;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "email must be a valid email address"))]
    #[schema(example = "admin@heightcert.local")]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, message = "refresh_token is required"))]
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RefreshTokenResponse {
    pub access_token: String,
}

/// What the UI needs to decide which controls to show.
///
/// `role` is `None` when the token carries a role this server does not
/// recognise; every flag is then false and `permissions` is empty.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MeResponse {
    pub user: User,
    pub role: Option<Role>,
    pub permissions: Vec<Permission>,
    pub is_admin: bool,
    pub can_coordinate: bool,
    pub can_view: bool,
}

impl MeResponse {
    pub fn new(user: User, role: Option<Role>) -> Self {
        Self {
            user,
            role,
            permissions: heightcert_core::permissions::permissions_for(role).to_vec(),
            is_admin: heightcert_core::permissions::is_admin(role),
            can_coordinate: heightcert_core::permissions::can_coordinate(role),
            can_view: heightcert_core::permissions::can_view(role),
        }
    }
}
