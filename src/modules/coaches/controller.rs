use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use heightcert_core::AppError;

use super::model::{
    Coach, CoachFilterParams, CreateCoachDto, PaginatedCoachesResponse, UpdateCoachDto,
};
use super::service::CoachService;
use crate::middleware::auth::{AuthUser, RequireManageCoaches};
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    get,
    path = "/api/coaches",
    params(CoachFilterParams),
    responses(
        (status = 200, description = "Paginated coaches", body = PaginatedCoachesResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Coaches",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth))]
pub async fn get_coaches(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(filters): Query<CoachFilterParams>,
) -> Result<Json<PaginatedCoachesResponse>, AppError> {
    Ok(Json(CoachService::get_coaches(&state.db, filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/coaches/{id}",
    params(("id" = Uuid, Path, description = "Coach ID")),
    responses(
        (status = 200, description = "Coach", body = Coach),
        (status = 404, description = "Coach not found")
    ),
    tag = "Coaches",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth))]
pub async fn get_coach(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Coach>, AppError> {
    Ok(Json(CoachService::get_coach(&state.db, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/coaches",
    request_body = CreateCoachDto,
    responses(
        (status = 201, description = "Coach created", body = Coach),
        (status = 403, description = "Forbidden - requires MANAGE_COACHES"),
        (status = 409, description = "License number already registered"),
        (status = 422, description = "Validation error")
    ),
    tag = "Coaches",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth, dto))]
pub async fn create_coach(
    State(state): State<AppState>,
    RequireManageCoaches(_auth): RequireManageCoaches,
    ValidatedJson(dto): ValidatedJson<CreateCoachDto>,
) -> Result<(StatusCode, Json<Coach>), AppError> {
    let coach = CoachService::create_coach(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(coach)))
}

#[utoipa::path(
    put,
    path = "/api/coaches/{id}",
    params(("id" = Uuid, Path, description = "Coach ID")),
    request_body = UpdateCoachDto,
    responses(
        (status = 200, description = "Coach updated", body = Coach),
        (status = 403, description = "Forbidden - requires MANAGE_COACHES"),
        (status = 404, description = "Coach not found"),
        (status = 409, description = "License number already registered")
    ),
    tag = "Coaches",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth, dto))]
pub async fn update_coach(
    State(state): State<AppState>,
    RequireManageCoaches(_auth): RequireManageCoaches,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateCoachDto>,
) -> Result<Json<Coach>, AppError> {
    Ok(Json(CoachService::update_coach(&state.db, id, dto).await?))
}

/// Delete a coach
///
/// Trainings run by the coach keep their history with no coach assigned.
#[utoipa::path(
    delete,
    path = "/api/coaches/{id}",
    params(("id" = Uuid, Path, description = "Coach ID")),
    responses(
        (status = 204, description = "Coach deleted"),
        (status = 403, description = "Forbidden - requires MANAGE_COACHES"),
        (status = 404, description = "Coach not found")
    ),
    tag = "Coaches",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_coach(
    State(state): State<AppState>,
    RequireManageCoaches(auth_user): RequireManageCoaches,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    CoachService::delete_coach(&state.db, id).await?;

    crate::audit_event!(
        "coach_deleted",
        "coach",
        actor.email = %auth_user.email(),
        coach.id = %id,
        "Coach deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}
