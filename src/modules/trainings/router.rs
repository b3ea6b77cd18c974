use axum::{
    Router,
    routing::{get, patch},
};

use crate::modules::enrollments::init_training_enrollments_router;
use crate::state::AppState;

use super::controller::{
    create_training, delete_training, get_training, get_trainings, update_training,
    update_training_status,
};

pub fn init_trainings_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_trainings).post(create_training))
        .route(
            "/{id}",
            get(get_training)
                .put(update_training)
                .delete(delete_training),
        )
        .route("/{id}/status", patch(update_training_status))
        .nest("/{id}/enrollments", init_training_enrollments_router())
}
