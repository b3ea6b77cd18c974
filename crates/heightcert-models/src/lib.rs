//! # Heightcert Models
//!
//! Database entities and request/response DTOs for the heightcert API.
//!
//! # Modules
//!
//! - [`auth`]: login, refresh and `me` payloads
//! - [`users`]: dashboard accounts
//! - [`collaborators`]: workers who attend trainings
//! - [`courses`]: course catalogue and levels
//! - [`coaches`]: instructors
//! - [`trainings`]: scheduled trainings and status changes
//! - [`enrollments`]: attendance and certificates
//! - [`dashboard`]: aggregates and monthly report
//! - [`ids`]: typed UUID wrappers

pub mod auth;
pub mod coaches;
pub mod collaborators;
pub mod courses;
pub mod dashboard;
pub mod enrollments;
pub mod ids;
pub mod trainings;
pub mod users;

pub use auth::{LoginRequest, LoginResponse, MeResponse, RefreshTokenRequest, RefreshTokenResponse};
pub use coaches::{
    Coach, CoachFilterParams, CoachSortBy, CreateCoachDto, PaginatedCoachesResponse,
    UpdateCoachDto,
};
pub use collaborators::{
    Collaborator, CollaboratorFilterParams, CollaboratorSortBy, CreateCollaboratorDto,
    PaginatedCollaboratorsResponse, UpdateCollaboratorDto,
};
pub use courses::{
    Course, CourseDetail, CourseFilterParams, CourseLevel, CourseSortBy, CreateCourseDto,
    CreateCourseLevelDto, PaginatedCoursesResponse, UpdateCourseDto,
};
pub use dashboard::{DashboardSummary, MonthlyReport, MonthlyStats, ReportQuery, StatusCount};
pub use enrollments::{CertificateUploadForm, CreateEnrollmentDto, Enrollment, EnrollmentView};
pub use ids::{
    CoachId, CollaboratorId, CourseId, CourseLevelId, EnrollmentId, TrainingId, UserId,
};
pub use trainings::{
    CreateTrainingDto, PaginatedTrainingsResponse, Training, TrainingDetail, TrainingFilterParams,
    TrainingSortBy, TrainingSummary, UpdateTrainingDto, UpdateTrainingStatusDto,
};
pub use users::{
    CreateUserDto, PaginatedUsersResponse, UpdateUserRoleDto, User, UserCredentials,
    UserFilterParams,
};
