use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{
    create_collaborator, delete_collaborator, get_collaborator, get_collaborators,
    update_collaborator,
};

pub fn init_collaborators_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_collaborators).post(create_collaborator))
        .route(
            "/{id}",
            get(get_collaborator)
                .put(update_collaborator)
                .delete(delete_collaborator),
        )
}
