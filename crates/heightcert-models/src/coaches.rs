//! Coaches: certified instructors who run trainings.

use chrono::{DateTime, Utc};
use heightcert_core::serde::{deserialize_optional_bool, deserialize_optional_trimmed};
use heightcert_core::{PaginationMeta, PaginationParams, SortOrder};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::ids::CoachId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Coach {
    pub id: CoachId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Instructor licence issued by the regulator
    pub license_number: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCoachDto {
    #[validate(length(min = 1, max = 100, message = "first_name must be 1-100 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "last_name must be 1-100 characters"))]
    pub last_name: String,
    #[validate(email(message = "email must be a valid email address"))]
    pub email: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    #[validate(length(min = 3, max = 50, message = "license_number must be 3-50 characters"))]
    pub license_number: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCoachDto {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(email(message = "email must be a valid email address"))]
    pub email: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    #[validate(length(min = 3, max = 50, message = "license_number must be 3-50 characters"))]
    pub license_number: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CoachSortBy {
    #[default]
    LastName,
    FirstName,
    CreatedAt,
}

impl CoachSortBy {
    pub const fn column(self) -> &'static str {
        match self {
            Self::LastName => "last_name",
            Self::FirstName => "first_name",
            Self::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CoachFilterParams {
    /// Matches name, email or license number
    #[serde(default, deserialize_with = "deserialize_optional_trimmed")]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub is_active: Option<bool>,
    pub sort_by: Option<CoachSortBy>,
    pub sort_order: Option<SortOrder>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedCoachesResponse {
    pub data: Vec<Coach>,
    pub meta: PaginationMeta,
}
