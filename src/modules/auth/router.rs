use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{get_me, login_user, refresh_token};

/// Routes under `/api/auth`. `/login` and `/refresh` carry the stricter
/// auth rate limit; `/me` sits behind the general one only.
pub fn init_auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login_user))
        .route("/refresh", post(refresh_token))
}

pub fn init_me_router() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}
