//! Training sessions: one scheduled run of a course, led by a coach.
//!
//! Status is deliberately absent from the create and update DTOs. It starts
//! as `PLANNED` and changes only through [`UpdateTrainingStatusDto`], which
//! goes through the transition guard.

use chrono::{DateTime, Utc};
use heightcert_core::serde::{
    deserialize_nullable, deserialize_optional_trimmed, deserialize_optional_uuid,
};
use heightcert_core::{PaginationMeta, PaginationParams, SortOrder, TrainingStatus};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::enrollments::EnrollmentView;
use crate::ids::{CoachId, CourseId, CourseLevelId, TrainingId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Training {
    pub id: TrainingId,
    pub code: String,
    pub course_id: CourseId,
    pub course_level_id: Option<CourseLevelId>,
    pub coach_id: Option<CoachId>,
    pub location: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    #[sqlx(try_from = "String")]
    pub status: TrainingStatus,
    /// Free-text note recorded with the last status change
    pub status_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// List row: the training plus names and counts for the dashboard tables.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct TrainingSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub training: Training,
    pub course_name: String,
    pub coach_name: Option<String>,
    pub enrollment_count: i64,
    pub certificate_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrainingDetail {
    #[serde(flatten)]
    pub summary: TrainingSummary,
    pub enrollments: Vec<EnrollmentView>,
}

fn validate_create_dates(dto: &CreateTrainingDto) -> Result<(), ValidationError> {
    match dto.end_date {
        Some(end) if end < dto.start_date => Err(ValidationError::new("end_before_start")
            .with_message("end_date must not be before start_date".into())),
        _ => Ok(()),
    }
}

fn validate_update_dates(dto: &UpdateTrainingDto) -> Result<(), ValidationError> {
    match (dto.start_date, dto.end_date) {
        (Some(start), Some(Some(end))) if end < start => Err(ValidationError::new("end_before_start")
            .with_message("end_date must not be before start_date".into())),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_create_dates"))]
pub struct CreateTrainingDto {
    #[validate(length(min = 2, max = 30, message = "code must be 2-30 characters"))]
    pub code: String,
    pub course_id: CourseId,
    pub course_level_id: Option<CourseLevelId>,
    pub coach_id: Option<CoachId>,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

/// Partial update. Omitted fields keep their value; `null` clears the
/// nullable ones (`course_level_id`, `coach_id`, `location`, `end_date`).
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_update_dates"))]
pub struct UpdateTrainingDto {
    #[validate(length(min = 2, max = 30, message = "code must be 2-30 characters"))]
    pub code: Option<String>,
    pub course_id: Option<CourseId>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    #[schema(value_type = Option<String>, format = Uuid)]
    pub course_level_id: Option<Option<CourseLevelId>>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    #[schema(value_type = Option<String>, format = Uuid)]
    pub coach_id: Option<Option<CoachId>>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    #[schema(value_type = Option<String>)]
    #[validate(length(max = 200))]
    pub location: Option<Option<String>>,
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub end_date: Option<Option<DateTime<Utc>>>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateTrainingStatusDto {
    pub status: TrainingStatus,
    #[validate(length(max = 500, message = "reason must be at most 500 characters"))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TrainingSortBy {
    #[default]
    StartDate,
    Code,
    Status,
    CreatedAt,
}

impl TrainingSortBy {
    pub const fn column(self) -> &'static str {
        match self {
            Self::StartDate => "t.start_date",
            Self::Code => "t.code",
            Self::Status => "t.status",
            Self::CreatedAt => "t.created_at",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TrainingFilterParams {
    /// Matches code or location
    #[serde(default, deserialize_with = "deserialize_optional_trimmed")]
    pub search: Option<String>,
    pub status: Option<TrainingStatus>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub course_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub coach_id: Option<Uuid>,
    /// Trainings starting at or after this instant
    pub from: Option<DateTime<Utc>>,
    /// Trainings starting before this instant
    pub to: Option<DateTime<Utc>>,
    pub sort_by: Option<TrainingSortBy>,
    pub sort_order: Option<SortOrder>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedTrainingsResponse {
    pub data: Vec<TrainingSummary>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn create_dto() -> CreateTrainingDto {
        CreateTrainingDto {
            code: "TR-2024-001".to_string(),
            course_id: CourseId::new(),
            course_level_id: None,
            coach_id: None,
            location: Some("Bodega 3".to_string()),
            start_date: Utc::now(),
            end_date: None,
        }
    }

    #[test]
    fn test_create_training_dto_valid() {
        assert!(create_dto().validate().is_ok());
    }

    #[test]
    fn test_end_before_start_is_rejected() {
        let dto = CreateTrainingDto {
            end_date: Some(Utc::now() - Duration::days(2)),
            ..create_dto()
        };
        assert!(dto.validate().is_err());

        let update = UpdateTrainingDto {
            start_date: Some(Utc::now()),
            end_date: Some(Some(Utc::now() - Duration::days(1))),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_update_dto_has_no_status_field() {
        let json = serde_json::json!({"status": "CANCELLED"});
        let dto: UpdateTrainingDto = serde_json::from_value(json).unwrap();
        assert!(dto.code.is_none());
    }

    #[test]
    fn test_update_dto_null_clears_and_absent_keeps() {
        let dto: UpdateTrainingDto = serde_json::from_value(serde_json::json!({
            "coach_id": null,
            "end_date": null,
            "location": "Planta sur"
        }))
        .unwrap();
        assert_eq!(dto.coach_id, Some(None));
        assert_eq!(dto.end_date, Some(None));
        assert_eq!(dto.location, Some(Some("Planta sur".to_string())));
        assert!(dto.course_level_id.is_none());
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_status_dto_parses() {
        let dto: UpdateTrainingStatusDto =
            serde_json::from_value(serde_json::json!({"status": "COMPLETED"})).unwrap();
        assert_eq!(dto.status, TrainingStatus::Completed);
        assert!(
            serde_json::from_value::<UpdateTrainingStatusDto>(serde_json::json!({"status": "DONE"}))
                .is_err()
        );
    }
}
