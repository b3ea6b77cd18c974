use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
};

use crate::state::AppState;

use super::controller::{create_enrollment, delete_enrollment, get_enrollments, upload_certificate};

/// Multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Nested under `/trainings/{id}/enrollments`.
pub fn init_training_enrollments_router() -> Router<AppState> {
    Router::new().route("/", get(get_enrollments).post(create_enrollment))
}

pub fn init_enrollments_router(max_file_size: usize) -> Router<AppState> {
    Router::new()
        .route("/{id}", delete(delete_enrollment))
        .route(
            "/{id}/certificate",
            post(upload_certificate)
                .layer(DefaultBodyLimit::max(max_file_size + MULTIPART_OVERHEAD)),
        )
}
