//! Dashboard users and their administration DTOs.

use chrono::{DateTime, Utc};
use heightcert_core::Role;
use heightcert_core::serde::{deserialize_optional_bool, deserialize_optional_trimmed};
use heightcert_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::ids::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Row used only by the login flow; never serialized.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: UserId,
    pub email: String,
    pub password: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUserDto {
    #[validate(length(min = 1, max = 100, message = "first_name must be 1-100 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "last_name must be 1-100 characters"))]
    pub last_name: String,
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRoleDto {
    pub role: Role,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserFilterParams {
    /// Matches name or email
    #[serde(default, deserialize_with = "deserialize_optional_trimmed")]
    pub search: Option<String>,
    pub role: Option<Role>,
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub is_active: Option<bool>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedUsersResponse {
    pub data: Vec<User>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto() -> CreateUserDto {
        CreateUserDto {
            first_name: "Ana".to_string(),
            last_name: "Rojas".to_string(),
            email: "ana.rojas@example.com".to_string(),
            password: "scaffold-2024".to_string(),
            role: Role::Coordinator,
        }
    }

    #[test]
    fn test_create_user_dto_valid() {
        assert!(dto().validate().is_ok());
    }

    #[test]
    fn test_create_user_dto_rejects_bad_email_and_short_password() {
        let mut bad = dto();
        bad.email = "not-an-email".to_string();
        assert!(bad.validate().is_err());

        let mut short = dto();
        short.password = "short".to_string();
        assert!(short.validate().is_err());
    }

    #[test]
    fn test_unknown_role_does_not_deserialize() {
        let json = serde_json::json!({
            "first_name": "A", "last_name": "B", "email": "a@b.co",
            "password": "12345678", "role": "SUPERUSER"
        });
        assert!(serde_json::from_value::<CreateUserDto>(json).is_err());
    }
}
