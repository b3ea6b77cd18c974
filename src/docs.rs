use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use heightcert_core::pagination::{PaginationMeta, SortOrder};
use heightcert_core::permissions::{Permission, Role};
use heightcert_core::training_status::TrainingStatus;
use heightcert_models::{
    CertificateUploadForm, Coach, CoachSortBy, Collaborator, CollaboratorSortBy, Course,
    CourseDetail, CourseLevel, CourseSortBy, CreateCoachDto, CreateCollaboratorDto,
    CreateCourseDto, CreateCourseLevelDto, CreateEnrollmentDto, CreateTrainingDto, CreateUserDto,
    DashboardSummary, Enrollment, EnrollmentView, LoginRequest, LoginResponse, MeResponse,
    MonthlyReport, MonthlyStats, PaginatedCoachesResponse, PaginatedCollaboratorsResponse,
    PaginatedCoursesResponse, PaginatedTrainingsResponse, PaginatedUsersResponse,
    RefreshTokenRequest, RefreshTokenResponse, StatusCount, Training, TrainingDetail,
    TrainingSortBy, TrainingSummary, UpdateCoachDto, UpdateCollaboratorDto, UpdateCourseDto,
    UpdateTrainingDto, UpdateTrainingStatusDto, UpdateUserRoleDto, User,
};

use crate::modules::auth::controller::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::login_user,
        crate::modules::auth::controller::refresh_token,
        crate::modules::auth::controller::get_me,
        crate::modules::users::controller::get_users,
        crate::modules::users::controller::create_user,
        crate::modules::users::controller::get_user,
        crate::modules::users::controller::change_user_role,
        crate::modules::collaborators::controller::get_collaborators,
        crate::modules::collaborators::controller::get_collaborator,
        crate::modules::collaborators::controller::create_collaborator,
        crate::modules::collaborators::controller::update_collaborator,
        crate::modules::collaborators::controller::delete_collaborator,
        crate::modules::courses::controller::get_courses,
        crate::modules::courses::controller::get_course,
        crate::modules::courses::controller::create_course,
        crate::modules::courses::controller::update_course,
        crate::modules::courses::controller::delete_course,
        crate::modules::courses::controller::get_course_levels,
        crate::modules::courses::controller::create_course_level,
        crate::modules::coaches::controller::get_coaches,
        crate::modules::coaches::controller::get_coach,
        crate::modules::coaches::controller::create_coach,
        crate::modules::coaches::controller::update_coach,
        crate::modules::coaches::controller::delete_coach,
        crate::modules::trainings::controller::get_trainings,
        crate::modules::trainings::controller::get_training,
        crate::modules::trainings::controller::create_training,
        crate::modules::trainings::controller::update_training,
        crate::modules::trainings::controller::update_training_status,
        crate::modules::trainings::controller::delete_training,
        crate::modules::enrollments::controller::get_enrollments,
        crate::modules::enrollments::controller::create_enrollment,
        crate::modules::enrollments::controller::delete_enrollment,
        crate::modules::enrollments::controller::upload_certificate,
        crate::modules::dashboard::controller::get_dashboard,
        crate::modules::dashboard::controller::get_monthly_report,
    ),
    components(
        schemas(
            ErrorResponse,
            Role,
            Permission,
            TrainingStatus,
            SortOrder,
            PaginationMeta,
            LoginRequest,
            LoginResponse,
            RefreshTokenRequest,
            RefreshTokenResponse,
            MeResponse,
            User,
            CreateUserDto,
            UpdateUserRoleDto,
            PaginatedUsersResponse,
            Collaborator,
            CreateCollaboratorDto,
            UpdateCollaboratorDto,
            CollaboratorSortBy,
            PaginatedCollaboratorsResponse,
            Course,
            CourseLevel,
            CourseDetail,
            CreateCourseDto,
            UpdateCourseDto,
            CreateCourseLevelDto,
            CourseSortBy,
            PaginatedCoursesResponse,
            Coach,
            CreateCoachDto,
            UpdateCoachDto,
            CoachSortBy,
            PaginatedCoachesResponse,
            Training,
            TrainingSummary,
            TrainingDetail,
            CreateTrainingDto,
            UpdateTrainingDto,
            UpdateTrainingStatusDto,
            TrainingSortBy,
            PaginatedTrainingsResponse,
            Enrollment,
            EnrollmentView,
            CreateEnrollmentDto,
            CertificateUploadForm,
            DashboardSummary,
            StatusCount,
            MonthlyStats,
            MonthlyReport,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Login, token refresh and the current user"),
        (name = "Users", description = "Dashboard accounts and their roles"),
        (name = "Collaborators", description = "Workers who attend height-work trainings"),
        (name = "Courses", description = "Course catalogue and course levels"),
        (name = "Coaches", description = "Instructors who run trainings"),
        (name = "Trainings", description = "Scheduled training sessions and their status"),
        (name = "Enrollments", description = "Training seats and certificate documents"),
        (name = "Dashboard", description = "Summary figures and monthly reports")
    ),
    info(
        title = "Heightcert API",
        version = "0.1.0",
        description = "Training and certification tracking for work-at-height programmes, with role-based access control.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
