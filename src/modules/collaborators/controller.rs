use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use heightcert_core::AppError;

use super::model::{
    Collaborator, CollaboratorFilterParams, CreateCollaboratorDto, PaginatedCollaboratorsResponse,
    UpdateCollaboratorDto,
};
use super::service::CollaboratorService;
use crate::middleware::auth::{AuthUser, RequireManageCollaborators};
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    get,
    path = "/api/collaborators",
    params(CollaboratorFilterParams),
    responses(
        (status = 200, description = "Paginated collaborators", body = PaginatedCollaboratorsResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Collaborators",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth))]
pub async fn get_collaborators(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(filters): Query<CollaboratorFilterParams>,
) -> Result<Json<PaginatedCollaboratorsResponse>, AppError> {
    let page = CollaboratorService::get_collaborators(&state.db, filters).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/collaborators/{id}",
    params(("id" = Uuid, Path, description = "Collaborator ID")),
    responses(
        (status = 200, description = "Collaborator", body = Collaborator),
        (status = 404, description = "Collaborator not found")
    ),
    tag = "Collaborators",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth))]
pub async fn get_collaborator(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Collaborator>, AppError> {
    let collaborator = CollaboratorService::get_collaborator(&state.db, id).await?;
    Ok(Json(collaborator))
}

#[utoipa::path(
    post,
    path = "/api/collaborators",
    request_body = CreateCollaboratorDto,
    responses(
        (status = 201, description = "Collaborator created", body = Collaborator),
        (status = 403, description = "Forbidden - requires MANAGE_COLLABORATORS"),
        (status = 409, description = "Document number already registered"),
        (status = 422, description = "Validation error")
    ),
    tag = "Collaborators",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth, dto))]
pub async fn create_collaborator(
    State(state): State<AppState>,
    RequireManageCollaborators(_auth): RequireManageCollaborators,
    ValidatedJson(dto): ValidatedJson<CreateCollaboratorDto>,
) -> Result<(StatusCode, Json<Collaborator>), AppError> {
    let collaborator = CollaboratorService::create_collaborator(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(collaborator)))
}

#[utoipa::path(
    put,
    path = "/api/collaborators/{id}",
    params(("id" = Uuid, Path, description = "Collaborator ID")),
    request_body = UpdateCollaboratorDto,
    responses(
        (status = 200, description = "Collaborator updated", body = Collaborator),
        (status = 403, description = "Forbidden - requires MANAGE_COLLABORATORS"),
        (status = 404, description = "Collaborator not found"),
        (status = 409, description = "Document number already registered")
    ),
    tag = "Collaborators",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth, dto))]
pub async fn update_collaborator(
    State(state): State<AppState>,
    RequireManageCollaborators(_auth): RequireManageCollaborators,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateCollaboratorDto>,
) -> Result<Json<Collaborator>, AppError> {
    let collaborator = CollaboratorService::update_collaborator(&state.db, id, dto).await?;
    Ok(Json(collaborator))
}

/// Delete a collaborator
///
/// Refused with 409 while the collaborator is enrolled in any training.
#[utoipa::path(
    delete,
    path = "/api/collaborators/{id}",
    params(("id" = Uuid, Path, description = "Collaborator ID")),
    responses(
        (status = 204, description = "Collaborator deleted"),
        (status = 403, description = "Forbidden - requires MANAGE_COLLABORATORS"),
        (status = 404, description = "Collaborator not found"),
        (status = 409, description = "Collaborator has enrollments")
    ),
    tag = "Collaborators",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_collaborator(
    State(state): State<AppState>,
    RequireManageCollaborators(auth_user): RequireManageCollaborators,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    CollaboratorService::delete_collaborator(&state.db, id).await?;

    crate::audit_event!(
        "collaborator_deleted",
        "collaborator",
        actor.email = %auth_user.email(),
        collaborator.id = %id,
        "Collaborator deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}
