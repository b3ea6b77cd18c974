use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use heightcert_auth::{Claims, verify_token};
use heightcert_core::permissions::{self, Permission, Role};
use heightcert_core::AppError;
use uuid::Uuid;

use crate::state::AppState;

/// Extractor that validates the bearer token and exposes its claims.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// `None` for a role string this build does not recognise.
    pub fn role(&self) -> Option<Role> {
        self.0.role()
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        permissions::has_permission(self.role(), permission)
    }

    pub fn has_any_permission(&self, permissions: &[Permission]) -> bool {
        permissions::has_any_permission(self.role(), permissions)
    }

    pub fn has_all_permissions(&self, permissions: &[Permission]) -> bool {
        permissions::has_all_permissions(self.role(), permissions)
    }

    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.0.sub)
            .map_err(|_| AppError::unauthorized("Invalid user ID in token"))
    }

    pub fn email(&self) -> &str {
        &self.0.email
    }

    /// Role label for logs and metrics.
    pub fn role_label(&self) -> &str {
        self.role().map_or("unknown", Role::as_str)
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::unauthorized("Invalid authorization header format"))?;

        let claims = verify_token(token, &state.jwt_config)?;

        Ok(AuthUser(claims))
    }
}

/// Rejects with 403 unless the caller's role holds `permission`. Denials are
/// logged as security events and counted.
pub fn ensure_permission(auth_user: &AuthUser, permission: Permission) -> Result<(), AppError> {
    if auth_user.has_permission(permission) {
        return Ok(());
    }

    crate::security_event!(
        "authorization_denied",
        user.email = %auth_user.email(),
        user.role = %auth_user.0.role,
        permission = %permission,
        "Permission check failed"
    );
    crate::metrics::track_authorization_denied(permission, auth_user.role_label());

    Err(AppError::forbidden(format!(
        "Access denied. Missing required permission: {}",
        permission
    )))
}

/// Declares an extractor that authenticates and then requires one permission.
#[macro_export]
macro_rules! require_permission {
    ($name:ident, $permission:expr) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub $crate::middleware::auth::AuthUser);

        impl axum::extract::FromRequestParts<$crate::state::AppState> for $name {
            type Rejection = heightcert_core::AppError;

            async fn from_request_parts(
                parts: &mut axum::http::request::Parts,
                state: &$crate::state::AppState,
            ) -> Result<Self, Self::Rejection> {
                let auth_user =
                    $crate::middleware::auth::AuthUser::from_request_parts(parts, state).await?;
                $crate::middleware::auth::ensure_permission(&auth_user, $permission)?;
                Ok($name(auth_user))
            }
        }
    };
}

require_permission!(RequireViewDashboard, Permission::ViewDashboard);
require_permission!(RequireViewReports, Permission::ViewReports);
require_permission!(RequireManageCollaborators, Permission::ManageCollaborators);
require_permission!(RequireManageTrainings, Permission::ManageTrainings);
require_permission!(RequireUploadDocuments, Permission::UploadDocuments);
require_permission!(RequireManageCourses, Permission::ManageCourses);
require_permission!(RequireManageCoaches, Permission::ManageCoaches);
require_permission!(RequireManageUsers, Permission::ManageUsers);
