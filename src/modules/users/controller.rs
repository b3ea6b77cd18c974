use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use heightcert_core::AppError;

use super::model::{CreateUserDto, PaginatedUsersResponse, UpdateUserRoleDto, User, UserFilterParams};
use super::service::UserService;
use crate::middleware::auth::RequireManageUsers;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    get,
    path = "/api/users",
    params(UserFilterParams),
    responses(
        (status = 200, description = "Paginated users", body = PaginatedUsersResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires MANAGE_USERS")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth))]
pub async fn get_users(
    State(state): State<AppState>,
    RequireManageUsers(_auth): RequireManageUsers,
    Query(filters): Query<UserFilterParams>,
) -> Result<Json<PaginatedUsersResponse>, AppError> {
    let users = UserService::get_users(&state.db, filters).await?;
    Ok(Json(users))
}

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserDto,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires MANAGE_USERS"),
        (status = 409, description = "Email already registered"),
        (status = 422, description = "Validation error")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto), fields(user.email = %dto.email, user.role = %dto.role))]
pub async fn create_user(
    State(state): State<AppState>,
    RequireManageUsers(auth_user): RequireManageUsers,
    ValidatedJson(dto): ValidatedJson<CreateUserDto>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = UserService::create_user(&state.db, dto).await?;

    crate::audit_event!(
        "user_created",
        "user",
        actor.email = %auth_user.email(),
        user.id = %user.id,
        user.role = %user.role,
        "User account created"
    );

    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = User),
        (status = 403, description = "Forbidden - requires MANAGE_USERS"),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth))]
pub async fn get_user(
    State(state): State<AppState>,
    RequireManageUsers(_auth): RequireManageUsers,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    let user = UserService::get_user(&state.db, id).await?;
    Ok(Json(user))
}

/// Change a user's role
///
/// The only way a role changes. Admins cannot change their own role, so the
/// last admin cannot lock everyone out by accident.
#[utoipa::path(
    patch,
    path = "/api/users/{id}/role",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRoleDto,
    responses(
        (status = 200, description = "Role updated", body = User),
        (status = 400, description = "Cannot change own role"),
        (status = 403, description = "Forbidden - requires MANAGE_USERS"),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn change_user_role(
    State(state): State<AppState>,
    RequireManageUsers(auth_user): RequireManageUsers,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateUserRoleDto>,
) -> Result<Json<User>, AppError> {
    if auth_user.user_id()? == id {
        return Err(AppError::bad_request(anyhow::anyhow!(
            "You cannot change your own role"
        )));
    }

    let (previous, user) = UserService::change_role(&state.db, id, dto.role).await?;

    crate::audit_event!(
        "role_changed",
        "user",
        actor.email = %auth_user.email(),
        user.id = %user.id,
        role.from = %previous,
        role.to = %user.role,
        "User role changed"
    );

    Ok(Json(user))
}
