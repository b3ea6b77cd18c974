//! Collaborators: the workers who attend trainings and receive certificates.

use chrono::{DateTime, Utc};
use heightcert_core::serde::{deserialize_optional_bool, deserialize_optional_trimmed};
use heightcert_core::{PaginationMeta, PaginationParams, SortOrder};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::ids::CollaboratorId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Collaborator {
    pub id: CollaboratorId,
    /// National ID or passport number
    pub document_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCollaboratorDto {
    #[validate(length(min = 3, max = 30, message = "document_number must be 3-30 characters"))]
    pub document_number: String,
    #[validate(length(min = 1, max = 100, message = "first_name must be 1-100 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "last_name must be 1-100 characters"))]
    pub last_name: String,
    #[validate(email(message = "email must be a valid email address"))]
    pub email: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    #[validate(length(max = 100))]
    pub position: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCollaboratorDto {
    #[validate(length(min = 3, max = 30, message = "document_number must be 3-30 characters"))]
    pub document_number: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(email(message = "email must be a valid email address"))]
    pub email: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    #[validate(length(max = 100))]
    pub position: Option<String>,
    pub is_active: Option<bool>,
}

/// Columns a collaborator list may be sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CollaboratorSortBy {
    #[default]
    LastName,
    FirstName,
    DocumentNumber,
    CreatedAt,
}

impl CollaboratorSortBy {
    pub const fn column(self) -> &'static str {
        match self {
            Self::LastName => "last_name",
            Self::FirstName => "first_name",
            Self::DocumentNumber => "document_number",
            Self::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CollaboratorFilterParams {
    /// Matches document number, name or email
    #[serde(default, deserialize_with = "deserialize_optional_trimmed")]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub is_active: Option<bool>,
    pub sort_by: Option<CollaboratorSortBy>,
    pub sort_order: Option<SortOrder>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedCollaboratorsResponse {
    pub data: Vec<Collaborator>,
    pub meta: PaginationMeta,
}
