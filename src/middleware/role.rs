//! Route layers that gate a whole router on a role capability.
//!
//! Handlers still take a `Require*` extractor for the exact permission; the
//! layer rejects callers early and keeps read-only routers closed to tokens
//! with an unrecognised role.
//!
//! ```rust,ignore
//! Router::new()
//!     .nest("/collaborators", init_collaborators_router())
//!     .route_layer(middleware::from_fn_with_state(state.clone(), require_viewer));
//! ```

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use heightcert_core::permissions::{self, Role};
use heightcert_core::AppError;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Runs `next` only if `allowed(role)` holds for the authenticated caller.
pub async fn require_roles(
    State(state): State<AppState>,
    req: Request,
    next: Next,
    requirement: &'static str,
    allowed: fn(Option<Role>) -> bool,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let auth_user = AuthUser::from_request_parts(&mut parts, &state).await?;

    if !allowed(auth_user.role()) {
        crate::security_event!(
            "role_denied",
            user.email = %auth_user.email(),
            user.role = %auth_user.0.role,
            requirement,
            "Role requirement not met"
        );
        return Err(AppError::forbidden(format!(
            "Access denied. Requires {} role",
            requirement
        )));
    }

    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// ADMIN only
pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    match require_roles(State(state), req, next, "ADMIN", permissions::is_admin).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

/// Any recognised role
pub async fn require_viewer(State(state): State<AppState>, req: Request, next: Next) -> Response {
    match require_roles(State(state), req, next, "a recognised", permissions::can_view).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}
