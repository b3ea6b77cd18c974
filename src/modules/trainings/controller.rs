use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use heightcert_core::AppError;

use super::model::{
    CreateTrainingDto, PaginatedTrainingsResponse, Training, TrainingDetail, TrainingFilterParams,
    UpdateTrainingDto, UpdateTrainingStatusDto,
};
use super::service::TrainingService;
use crate::middleware::auth::{AuthUser, RequireManageTrainings};
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    get,
    path = "/api/trainings",
    params(TrainingFilterParams),
    responses(
        (status = 200, description = "Paginated trainings with enrollment and certificate counts", body = PaginatedTrainingsResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Trainings",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth))]
pub async fn get_trainings(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(filters): Query<TrainingFilterParams>,
) -> Result<Json<PaginatedTrainingsResponse>, AppError> {
    Ok(Json(TrainingService::get_trainings(&state.db, filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/trainings/{id}",
    params(("id" = Uuid, Path, description = "Training ID")),
    responses(
        (status = 200, description = "Training with its enrollments", body = TrainingDetail),
        (status = 404, description = "Training not found")
    ),
    tag = "Trainings",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth))]
pub async fn get_training(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TrainingDetail>, AppError> {
    let detail = TrainingService::get_training_detail(&state.db, state.storage.as_ref(), id).await?;
    Ok(Json(detail))
}

/// Schedule a training
///
/// New trainings start as `PLANNED`.
#[utoipa::path(
    post,
    path = "/api/trainings",
    request_body = CreateTrainingDto,
    responses(
        (status = 201, description = "Training created", body = Training),
        (status = 400, description = "Unknown course, level or coach"),
        (status = 403, description = "Forbidden - requires MANAGE_TRAININGS"),
        (status = 409, description = "Training code already exists"),
        (status = 422, description = "Validation error")
    ),
    tag = "Trainings",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn create_training(
    State(state): State<AppState>,
    RequireManageTrainings(auth_user): RequireManageTrainings,
    ValidatedJson(dto): ValidatedJson<CreateTrainingDto>,
) -> Result<(StatusCode, Json<Training>), AppError> {
    let training = TrainingService::create_training(&state.db, dto).await?;

    crate::audit_event!(
        "training_created",
        "training",
        actor.email = %auth_user.email(),
        training.id = %training.id,
        training.code = %training.code,
        "Training scheduled"
    );

    Ok((StatusCode::CREATED, Json(training)))
}

/// Update scheduling details
///
/// Does not change status; use `PATCH /api/trainings/{id}/status`.
#[utoipa::path(
    put,
    path = "/api/trainings/{id}",
    params(("id" = Uuid, Path, description = "Training ID")),
    request_body = UpdateTrainingDto,
    responses(
        (status = 200, description = "Training updated", body = Training),
        (status = 400, description = "Unknown course, level or coach"),
        (status = 403, description = "Forbidden - requires MANAGE_TRAININGS"),
        (status = 404, description = "Training not found"),
        (status = 409, description = "Training code already exists"),
        (status = 422, description = "Validation error")
    ),
    tag = "Trainings",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth, dto))]
pub async fn update_training(
    State(state): State<AppState>,
    RequireManageTrainings(_auth): RequireManageTrainings,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateTrainingDto>,
) -> Result<Json<Training>, AppError> {
    Ok(Json(TrainingService::update_training(&state.db, id, dto).await?))
}

/// Change training status
///
/// Cancelling is refused once any certificate was issued, and completing is
/// refused before the start date. The refusal reason is returned verbatim.
#[utoipa::path(
    patch,
    path = "/api/trainings/{id}/status",
    params(("id" = Uuid, Path, description = "Training ID")),
    request_body = UpdateTrainingStatusDto,
    responses(
        (status = 200, description = "Status updated", body = Training),
        (status = 400, description = "Transition refused, e.g. `cannot cancel: certificates already issued`"),
        (status = 403, description = "Forbidden - requires MANAGE_TRAININGS"),
        (status = 404, description = "Training not found")
    ),
    tag = "Trainings",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_training_status(
    State(state): State<AppState>,
    RequireManageTrainings(auth_user): RequireManageTrainings,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateTrainingStatusDto>,
) -> Result<Json<Training>, AppError> {
    let (previous, training) = TrainingService::update_status(&state.db, id, dto).await?;

    crate::audit_event!(
        "status_changed",
        "training",
        actor.email = %auth_user.email(),
        training.id = %training.id,
        status.from = %previous,
        status.to = %training.status,
        status.reason = training.status_reason.as_deref().unwrap_or(""),
        "Training status changed"
    );

    Ok(Json(training))
}

/// Delete a training
///
/// Enrollments and their certificate documents are removed with it.
#[utoipa::path(
    delete,
    path = "/api/trainings/{id}",
    params(("id" = Uuid, Path, description = "Training ID")),
    responses(
        (status = 204, description = "Training deleted"),
        (status = 403, description = "Forbidden - requires MANAGE_TRAININGS"),
        (status = 404, description = "Training not found")
    ),
    tag = "Trainings",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_training(
    State(state): State<AppState>,
    RequireManageTrainings(auth_user): RequireManageTrainings,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    TrainingService::delete_training(&state.db, state.storage.as_ref(), id).await?;

    crate::audit_event!(
        "training_deleted",
        "training",
        actor.email = %auth_user.email(),
        training.id = %id,
        "Training deleted with its enrollments"
    );

    Ok(StatusCode::NO_CONTENT)
}
