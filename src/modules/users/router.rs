use axum::{
    Router,
    routing::{get, patch},
};

use crate::state::AppState;

use super::controller::{change_user_role, create_user, get_user, get_users};

pub fn init_users_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_users).post(create_user))
        .route("/{id}", get(get_user))
        .route("/{id}/role", patch(change_user_role))
}
