use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{create_coach, delete_coach, get_coach, get_coaches, update_coach};

pub fn init_coaches_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_coaches).post(create_coach))
        .route(
            "/{id}",
            get(get_coach).put(update_coach).delete(delete_coach),
        )
}
