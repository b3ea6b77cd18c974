use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use heightcert_core::AppError;

use super::model::{
    Course, CourseDetail, CourseFilterParams, CourseLevel, CreateCourseDto, CreateCourseLevelDto,
    PaginatedCoursesResponse, UpdateCourseDto,
};
use super::service::CourseService;
use crate::middleware::auth::{AuthUser, RequireManageCourses};
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    get,
    path = "/api/courses",
    params(CourseFilterParams),
    responses(
        (status = 200, description = "Paginated courses", body = PaginatedCoursesResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth))]
pub async fn get_courses(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(filters): Query<CourseFilterParams>,
) -> Result<Json<PaginatedCoursesResponse>, AppError> {
    Ok(Json(CourseService::get_courses(&state.db, filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course with its levels", body = CourseDetail),
        (status = 404, description = "Course not found")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth))]
pub async fn get_course(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CourseDetail>, AppError> {
    Ok(Json(CourseService::get_course_detail(&state.db, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/courses",
    request_body = CreateCourseDto,
    responses(
        (status = 201, description = "Course created", body = Course),
        (status = 403, description = "Forbidden - requires MANAGE_COURSES"),
        (status = 409, description = "Course code already exists"),
        (status = 422, description = "Validation error")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth, dto))]
pub async fn create_course(
    State(state): State<AppState>,
    RequireManageCourses(_auth): RequireManageCourses,
    ValidatedJson(dto): ValidatedJson<CreateCourseDto>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    let course = CourseService::create_course(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

#[utoipa::path(
    put,
    path = "/api/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    request_body = UpdateCourseDto,
    responses(
        (status = 200, description = "Course updated", body = Course),
        (status = 403, description = "Forbidden - requires MANAGE_COURSES"),
        (status = 404, description = "Course not found"),
        (status = 409, description = "Course code already exists")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth, dto))]
pub async fn update_course(
    State(state): State<AppState>,
    RequireManageCourses(_auth): RequireManageCourses,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateCourseDto>,
) -> Result<Json<Course>, AppError> {
    Ok(Json(CourseService::update_course(&state.db, id, dto).await?))
}

/// Delete a course
///
/// Levels go with it. Refused with 409 while any training uses the course.
#[utoipa::path(
    delete,
    path = "/api/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 204, description = "Course deleted"),
        (status = 403, description = "Forbidden - requires MANAGE_COURSES"),
        (status = 404, description = "Course not found"),
        (status = 409, description = "Course has trainings")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_course(
    State(state): State<AppState>,
    RequireManageCourses(auth_user): RequireManageCourses,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    CourseService::delete_course(&state.db, id).await?;

    crate::audit_event!(
        "course_deleted",
        "course",
        actor.email = %auth_user.email(),
        course.id = %id,
        "Course deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}/levels",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Levels of the course", body = Vec<CourseLevel>),
        (status = 404, description = "Course not found")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth))]
pub async fn get_course_levels(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<CourseLevel>>, AppError> {
    CourseService::get_course(&state.db, id).await?;
    Ok(Json(CourseService::get_levels(&state.db, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/courses/{id}/levels",
    params(("id" = Uuid, Path, description = "Course ID")),
    request_body = CreateCourseLevelDto,
    responses(
        (status = 201, description = "Level created", body = CourseLevel),
        (status = 403, description = "Forbidden - requires MANAGE_COURSES"),
        (status = 404, description = "Course not found"),
        (status = 409, description = "Level name already used in this course")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth, dto))]
pub async fn create_course_level(
    State(state): State<AppState>,
    RequireManageCourses(_auth): RequireManageCourses,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<CreateCourseLevelDto>,
) -> Result<(StatusCode, Json<CourseLevel>), AppError> {
    let level = CourseService::create_level(&state.db, id, dto).await?;
    Ok((StatusCode::CREATED, Json(level)))
}
