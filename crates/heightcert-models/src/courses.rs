//! Course catalogue. A course defines the certification (code, hours,
//! validity); levels split it into graded stages such as basic or advanced.

use chrono::{DateTime, Utc};
use heightcert_core::serde::{deserialize_optional_bool, deserialize_optional_trimmed};
use heightcert_core::{PaginationMeta, PaginationParams, SortOrder};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::ids::{CourseId, CourseLevelId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Course {
    pub id: CourseId,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub duration_hours: i32,
    /// How long an issued certificate stays valid
    pub validity_months: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CourseLevel {
    pub id: CourseLevelId,
    pub course_id: CourseId,
    pub name: String,
    pub description: Option<String>,
    pub hours: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: Course,
    pub levels: Vec<CourseLevel>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCourseDto {
    #[validate(length(min = 2, max = 20, message = "code must be 2-20 characters"))]
    pub code: String,
    #[validate(length(min = 1, max = 150, message = "name must be 1-150 characters"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 1, max = 1000, message = "duration_hours must be between 1 and 1000"))]
    pub duration_hours: i32,
    #[validate(range(min = 1, max = 120, message = "validity_months must be between 1 and 120"))]
    pub validity_months: i32,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCourseDto {
    #[validate(length(min = 2, max = 20, message = "code must be 2-20 characters"))]
    pub code: Option<String>,
    #[validate(length(min = 1, max = 150))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 1, max = 1000))]
    pub duration_hours: Option<i32>,
    #[validate(range(min = 1, max = 120))]
    pub validity_months: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCourseLevelDto {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 1, max = 1000, message = "hours must be between 1 and 1000"))]
    pub hours: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CourseSortBy {
    #[default]
    Name,
    Code,
    DurationHours,
    CreatedAt,
}

impl CourseSortBy {
    pub const fn column(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Code => "code",
            Self::DurationHours => "duration_hours",
            Self::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CourseFilterParams {
    /// Matches code or name
    #[serde(default, deserialize_with = "deserialize_optional_trimmed")]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub is_active: Option<bool>,
    pub sort_by: Option<CourseSortBy>,
    pub sort_order: Option<SortOrder>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedCoursesResponse {
    pub data: Vec<Course>,
    pub meta: PaginationMeta,
}
