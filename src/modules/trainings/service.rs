use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use heightcert_core::training_status::validate_transition;
use heightcert_core::{AppError, FileStorage, PaginationMeta, TrainingStatus, TransitionState};

use super::model::{
    CreateTrainingDto, PaginatedTrainingsResponse, Training, TrainingDetail,
    TrainingFilterParams, TrainingSummary, UpdateTrainingDto, UpdateTrainingStatusDto,
};
use crate::metrics::{track_training_status_changed, track_training_transition_rejected};
use crate::modules::enrollments::service::EnrollmentService;
use crate::utils::db_errors::map_write_error;
use crate::utils::search::contains_pattern;
use crate::utils::tracing::ErrorExt;

const DUPLICATE_CODE: &str = "A training with this code already exists";
const MISSING_REFERENCE: &str = "Course, course level or coach does not exist";

const SUMMARY_SELECT: &str = r#"SELECT
        t.*,
        c.name AS course_name,
        co.first_name || ' ' || co.last_name AS coach_name,
        COUNT(e.id) AS enrollment_count,
        COUNT(e.id) FILTER (WHERE e.certificate_issued) AS certificate_count
    FROM trainings t
    JOIN courses c ON c.id = t.course_id
    LEFT JOIN coaches co ON co.id = t.coach_id
    LEFT JOIN enrollments e ON e.training_id = t.id"#;

const SUMMARY_GROUP_BY: &str = " GROUP BY t.id, c.id, co.id";

/// What the status guard needs, read in one round trip.
#[derive(sqlx::FromRow)]
struct GuardRow {
    status: String,
    start_date: DateTime<Utc>,
    has_issued_certificates: bool,
}

pub struct TrainingService;

impl TrainingService {
    /// A level must belong to the training's course.
    async fn ensure_level_matches_course(
        db: &PgPool,
        course_level_id: Uuid,
        course_id: Uuid,
    ) -> Result<(), AppError> {
        let matches = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM course_levels WHERE id = $1 AND course_id = $2)",
        )
        .bind(course_level_id)
        .bind(course_id)
        .fetch_one(db)
        .await?;

        if !matches {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Course level does not belong to the selected course"
            )));
        }
        Ok(())
    }

    #[instrument(skip(db, dto), fields(training.code = %dto.code, db.operation = "INSERT", db.table = "trainings"))]
    pub async fn create_training(
        db: &PgPool,
        dto: CreateTrainingDto,
    ) -> Result<Training, AppError> {
        if let Some(level_id) = dto.course_level_id {
            Self::ensure_level_matches_course(db, level_id.into_inner(), dto.course_id.into_inner())
                .await?;
        }

        let training = sqlx::query_as::<_, Training>(
            r#"INSERT INTO trainings
                   (code, course_id, course_level_id, coach_id, location, start_date, end_date)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING *"#,
        )
        .bind(dto.code.trim())
        .bind(dto.course_id)
        .bind(dto.course_level_id)
        .bind(dto.coach_id)
        .bind(&dto.location)
        .bind(dto.start_date)
        .bind(dto.end_date)
        .fetch_one(db)
        .await
        .map_err(|e| map_write_error(e, DUPLICATE_CODE, MISSING_REFERENCE))?;

        info!(training.id = %training.id, "Training created");
        Ok(training)
    }

    #[instrument(skip(db, filters), fields(db.operation = "SELECT", db.table = "trainings"))]
    pub async fn get_trainings(
        db: &PgPool,
        filters: TrainingFilterParams,
    ) -> Result<PaginatedTrainingsResponse, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();

        let mut where_clause = String::from(" WHERE 1=1");
        let mut params: Vec<String> = Vec::new();

        if let Some(search) = &filters.search {
            params.push(contains_pattern(search));
            let n = params.len();
            where_clause.push_str(&format!(" AND (t.code ILIKE ${n} ESCAPE '\\' OR t.location ILIKE ${n} ESCAPE '\\')"));
        }
        if let Some(status) = filters.status {
            params.push(status.as_str().to_string());
            where_clause.push_str(&format!(" AND t.status = ${}", params.len()));
        }
        if let Some(course_id) = filters.course_id {
            params.push(course_id.to_string());
            where_clause.push_str(&format!(" AND t.course_id = ${}::uuid", params.len()));
        }
        if let Some(coach_id) = filters.coach_id {
            params.push(coach_id.to_string());
            where_clause.push_str(&format!(" AND t.coach_id = ${}::uuid", params.len()));
        }
        if let Some(from) = filters.from {
            params.push(from.to_rfc3339());
            where_clause.push_str(&format!(" AND t.start_date >= ${}::timestamptz", params.len()));
        }
        if let Some(to) = filters.to {
            params.push(to.to_rfc3339());
            where_clause.push_str(&format!(" AND t.start_date < ${}::timestamptz", params.len()));
        }

        let count_query = format!("SELECT COUNT(*) FROM trainings t{where_clause}");
        let mut count_sql = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_sql = count_sql.bind(param);
        }
        let total = count_sql.fetch_one(db).await?;

        let data_query = format!(
            "{SUMMARY_SELECT}{where_clause}{SUMMARY_GROUP_BY} ORDER BY {} {}, t.id LIMIT {limit} OFFSET {offset}",
            filters.sort_by.unwrap_or_default().column(),
            filters.sort_order.unwrap_or_default().as_sql(),
        );
        let mut data_sql = sqlx::query_as::<_, TrainingSummary>(&data_query);
        for param in params {
            data_sql = data_sql.bind(param);
        }
        let trainings = data_sql.fetch_all(db).await?;

        Ok(PaginatedTrainingsResponse {
            data: trainings,
            meta: PaginationMeta::new(&filters.pagination, total),
        })
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "trainings"))]
    pub async fn get_training(db: &PgPool, id: Uuid) -> Result<Training, AppError> {
        sqlx::query_as::<_, Training>("SELECT * FROM trainings WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Training not found")))
    }

    /// Summary row plus every enrollment, with certificate URLs resolved.
    #[instrument(skip(db, storage), fields(db.operation = "SELECT", db.table = "trainings,enrollments"))]
    pub async fn get_training_detail(
        db: &PgPool,
        storage: &dyn FileStorage,
        id: Uuid,
    ) -> Result<TrainingDetail, AppError> {
        let summary = sqlx::query_as::<_, TrainingSummary>(&format!(
            "{SUMMARY_SELECT} WHERE t.id = $1{SUMMARY_GROUP_BY}"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Training not found")))?;

        let enrollments = EnrollmentService::get_enrollments(db, storage, id).await?;

        Ok(TrainingDetail {
            summary,
            enrollments,
        })
    }

    /// Updates scheduling fields. Status is not touched here.
    #[instrument(skip(db, dto), fields(db.operation = "UPDATE", db.table = "trainings"))]
    pub async fn update_training(
        db: &PgPool,
        id: Uuid,
        dto: UpdateTrainingDto,
    ) -> Result<Training, AppError> {
        let current = Self::get_training(db, id).await?;

        let course_id = dto.course_id.unwrap_or(current.course_id);
        let course_level_id = match dto.course_level_id {
            Some(level) => level,
            // a level from the old course cannot follow the training to a new one
            None if course_id != current.course_id => None,
            None => current.course_level_id,
        };
        let start_date = dto.start_date.unwrap_or(current.start_date);
        let end_date = dto.end_date.unwrap_or(current.end_date);

        if let Some(end) = end_date
            && end < start_date
        {
            return Err(AppError::unprocessable(anyhow::anyhow!(
                "end_date must not be before start_date"
            )));
        }
        if let Some(Some(level_id)) = dto.course_level_id {
            Self::ensure_level_matches_course(db, level_id.into_inner(), course_id.into_inner())
                .await?;
        }

        sqlx::query_as::<_, Training>(
            r#"UPDATE trainings SET
                   code = $2,
                   course_id = $3,
                   course_level_id = $4,
                   coach_id = $5,
                   location = $6,
                   start_date = $7,
                   end_date = $8,
                   updated_at = NOW()
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(id)
        .bind(dto.code.as_deref().map(str::trim).unwrap_or(&current.code))
        .bind(course_id)
        .bind(course_level_id)
        .bind(dto.coach_id.unwrap_or(current.coach_id))
        .bind(dto.location.unwrap_or(current.location))
        .bind(start_date)
        .bind(end_date)
        .fetch_optional(db)
        .await
        .map_err(|e| map_write_error(e, DUPLICATE_CODE, MISSING_REFERENCE))?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Training not found")))
    }

    /// Moves a training to `dto.status` if the transition guard allows it.
    ///
    /// Returns the previous status with the updated training. The guard reads
    /// the current state immediately before the single `UPDATE`; two
    /// concurrent requests are not serialized against each other.
    #[instrument(skip(db, dto), fields(training.status.requested = %dto.status, db.operation = "UPDATE", db.table = "trainings"))]
    pub async fn update_status(
        db: &PgPool,
        id: Uuid,
        dto: UpdateTrainingStatusDto,
    ) -> Result<(TrainingStatus, Training), AppError> {
        let row = sqlx::query_as::<_, GuardRow>(
            r#"SELECT
                   t.status,
                   t.start_date,
                   EXISTS(
                       SELECT 1 FROM enrollments e
                       WHERE e.training_id = t.id AND e.certificate_issued
                   ) AS has_issued_certificates
               FROM trainings t
               WHERE t.id = $1"#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Training not found")))?;

        let current: TrainingStatus = row.status.parse().map_err(AppError::internal)?;
        let state = TransitionState {
            status: current,
            start_date: row.start_date,
            has_issued_certificates: row.has_issued_certificates,
        };

        if let Err(rejection) = validate_transition(&state, dto.status, Utc::now()) {
            track_training_transition_rejected(dto.status);
            crate::security_event!(
                "transition_rejected",
                training.id = %id,
                training.status.current = %current,
                training.status.requested = %dto.status,
                reason = %rejection,
                "Training status change refused"
            );
            return Err(AppError::bad_request(rejection));
        }

        let reason = dto
            .reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty());

        let training = sqlx::query_as::<_, Training>(
            r#"UPDATE trainings
               SET status = $2, status_reason = $3, updated_at = NOW()
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(id)
        .bind(dto.status.as_str())
        .bind(reason)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Training not found")))?;

        track_training_status_changed(current, training.status);
        Ok((current, training))
    }

    /// Deletes the training and its enrollments in one transaction, then
    /// removes the certificate files. A file that fails to delete is logged
    /// and left behind; the rows are already gone.
    #[instrument(skip(db, storage), fields(db.operation = "DELETE", db.table = "trainings,enrollments"))]
    pub async fn delete_training(
        db: &PgPool,
        storage: &dyn FileStorage,
        id: Uuid,
    ) -> Result<(), AppError> {
        let mut tx = db.begin().await?;

        let paths = sqlx::query_scalar::<_, String>(
            "SELECT certificate_path FROM enrollments WHERE training_id = $1 AND certificate_path IS NOT NULL",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM enrollments WHERE training_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM trainings WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(AppError::not_found(anyhow::anyhow!("Training not found")));
        }

        tx.commit().await?;

        for path in &paths {
            let _ = storage
                .delete(path)
                .await
                .log_error("deleting certificate of removed training");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use heightcert_core::LocalFileStorage;
    use heightcert_models::{CoachId, CourseId, CourseLevelId};

    async fn create_course(db: &PgPool, code: &str) -> Uuid {
        sqlx::query_scalar(
            "INSERT INTO courses (code, name, duration_hours, validity_months)
             VALUES ($1, 'Trabajo en alturas', 40, 12) RETURNING id",
        )
        .bind(code)
        .fetch_one(db)
        .await
        .unwrap()
    }

    async fn create_collaborator(db: &PgPool, document: &str) -> Uuid {
        sqlx::query_scalar(
            "INSERT INTO collaborators (document_number, first_name, last_name)
             VALUES ($1, 'Luis', 'Gómez') RETURNING id",
        )
        .bind(document)
        .fetch_one(db)
        .await
        .unwrap()
    }

    async fn enroll(db: &PgPool, training_id: Uuid, document: &str, certified: bool) {
        let collaborator_id = create_collaborator(db, document).await;
        sqlx::query(
            "INSERT INTO enrollments (training_id, collaborator_id, certificate_issued, certificate_number, certificate_path)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(training_id)
        .bind(collaborator_id)
        .bind(certified)
        .bind(certified.then(|| format!("CERT-{document}")))
        .bind(certified.then(|| format!("certificates/{document}.pdf")))
        .execute(db)
        .await
        .unwrap();
    }

    fn create_dto(course_id: Uuid, code: &str, start: DateTime<Utc>) -> CreateTrainingDto {
        CreateTrainingDto {
            code: code.to_string(),
            course_id: CourseId::from_uuid(course_id),
            course_level_id: None,
            coach_id: None,
            location: Some("Bodega 3".to_string()),
            start_date: start,
            end_date: None,
        }
    }

    fn status(status: TrainingStatus) -> UpdateTrainingStatusDto {
        UpdateTrainingStatusDto {
            status,
            reason: None,
        }
    }

    async fn training(db: &PgPool, start: DateTime<Utc>) -> Uuid {
        let course_id = create_course(db, "TSA").await;
        TrainingService::create_training(db, create_dto(course_id, "TR-001", start))
            .await
            .unwrap()
            .id
            .into_inner()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_new_training_is_planned(pool: PgPool) {
        let id = training(&pool, Utc::now() + Duration::days(3)).await;
        let t = TrainingService::get_training(&pool, id).await.unwrap();
        assert_eq!(t.status, TrainingStatus::Planned);
        assert!(t.status_reason.is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_duplicate_code_is_conflict(pool: PgPool) {
        let course_id = create_course(&pool, "TSA").await;
        TrainingService::create_training(&pool, create_dto(course_id, "TR-001", Utc::now()))
            .await
            .unwrap();
        let err =
            TrainingService::create_training(&pool, create_dto(course_id, "TR-001", Utc::now()))
                .await
                .unwrap_err();
        assert_eq!(err.status.as_u16(), 409);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_unknown_course_is_bad_request(pool: PgPool) {
        let err = TrainingService::create_training(
            &pool,
            create_dto(Uuid::new_v4(), "TR-404", Utc::now()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status.as_u16(), 400);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_level_from_other_course_is_rejected(pool: PgPool) {
        let course_a = create_course(&pool, "TSA").await;
        let course_b = create_course(&pool, "TSB").await;
        let level_b: Uuid = sqlx::query_scalar(
            "INSERT INTO course_levels (course_id, name, hours) VALUES ($1, 'Básico', 8) RETURNING id",
        )
        .bind(course_b)
        .fetch_one(&pool)
        .await
        .unwrap();

        let dto = CreateTrainingDto {
            course_level_id: Some(CourseLevelId::from_uuid(level_b)),
            ..create_dto(course_a, "TR-002", Utc::now())
        };
        let err = TrainingService::create_training(&pool, dto).await.unwrap_err();
        assert_eq!(err.status.as_u16(), 400);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_cancel_with_certificates_is_rejected(pool: PgPool) {
        let id = training(&pool, Utc::now() - Duration::days(5)).await;
        enroll(&pool, id, "1001", true).await;
        enroll(&pool, id, "1002", false).await;

        let err = TrainingService::update_status(&pool, id, status(TrainingStatus::Cancelled))
            .await
            .unwrap_err();
        assert_eq!(err.status.as_u16(), 400);
        assert_eq!(err.error.to_string(), "cannot cancel: certificates already issued");

        let t = TrainingService::get_training(&pool, id).await.unwrap();
        assert_eq!(t.status, TrainingStatus::Planned);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_cancel_without_certificates_records_reason(pool: PgPool) {
        let id = training(&pool, Utc::now() + Duration::days(5)).await;
        enroll(&pool, id, "1001", false).await;

        let dto = UpdateTrainingStatusDto {
            status: TrainingStatus::Cancelled,
            reason: Some("  Weather  ".to_string()),
        };
        let (previous, t) = TrainingService::update_status(&pool, id, dto).await.unwrap();
        assert_eq!(previous, TrainingStatus::Planned);
        assert_eq!(t.status, TrainingStatus::Cancelled);
        assert_eq!(t.status_reason.as_deref(), Some("Weather"));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_complete_before_start_is_rejected(pool: PgPool) {
        let id = training(&pool, Utc::now() + Duration::days(2)).await;

        let err = TrainingService::update_status(&pool, id, status(TrainingStatus::Completed))
            .await
            .unwrap_err();
        assert_eq!(err.status.as_u16(), 400);
        assert_eq!(err.error.to_string(), "cannot complete before start date");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_complete_after_start_then_regress(pool: PgPool) {
        let id = training(&pool, Utc::now() - Duration::days(1)).await;

        let (_, t) = TrainingService::update_status(&pool, id, status(TrainingStatus::Completed))
            .await
            .unwrap();
        assert_eq!(t.status, TrainingStatus::Completed);

        // regressive transitions are allowed
        let (previous, t) =
            TrainingService::update_status(&pool, id, status(TrainingStatus::Planned))
                .await
                .unwrap();
        assert_eq!(previous, TrainingStatus::Completed);
        assert_eq!(t.status, TrainingStatus::Planned);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_status_of_missing_training_is_not_found(pool: PgPool) {
        let err =
            TrainingService::update_status(&pool, Uuid::new_v4(), status(TrainingStatus::Active))
                .await
                .unwrap_err();
        assert_eq!(err.status.as_u16(), 404);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_update_merges_and_checks_dates(pool: PgPool) {
        let start = Utc::now() + Duration::days(10);
        let id = training(&pool, start).await;

        let t = TrainingService::update_training(
            &pool,
            id,
            UpdateTrainingDto {
                location: Some(Some("Planta norte".to_string())),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(t.location.as_deref(), Some("Planta norte"));
        assert_eq!(t.code, "TR-001");

        let err = TrainingService::update_training(
            &pool,
            id,
            UpdateTrainingDto {
                end_date: Some(Some(start - Duration::days(1))),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.status.as_u16(), 422);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_update_null_clears_optional_fields(pool: PgPool) {
        let start = Utc::now() + Duration::days(10);
        let id = training(&pool, start).await;
        let coach_id: Uuid = sqlx::query_scalar(
            "INSERT INTO coaches (first_name, last_name) VALUES ('Marta', 'Salazar') RETURNING id",
        )
        .fetch_one(&pool)
        .await
        .unwrap();

        let t = TrainingService::update_training(
            &pool,
            id,
            UpdateTrainingDto {
                coach_id: Some(Some(CoachId::from_uuid(coach_id))),
                end_date: Some(Some(start + Duration::days(2))),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(t.coach_id.map(CoachId::into_inner), Some(coach_id));
        assert!(t.end_date.is_some());

        let dto: UpdateTrainingDto = serde_json::from_value(serde_json::json!({
            "coach_id": null,
            "location": null,
            "end_date": null
        }))
        .unwrap();
        let t = TrainingService::update_training(&pool, id, dto).await.unwrap();
        assert!(t.coach_id.is_none());
        assert!(t.location.is_none());
        assert!(t.end_date.is_none());
        assert_eq!(t.code, "TR-001");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_list_counts_and_filters(pool: PgPool) {
        let course_id = create_course(&pool, "TSA").await;
        let a = TrainingService::create_training(
            &pool,
            create_dto(course_id, "TR-A", Utc::now() - Duration::days(3)),
        )
        .await
        .unwrap();
        TrainingService::create_training(
            &pool,
            create_dto(course_id, "TR-B", Utc::now() + Duration::days(3)),
        )
        .await
        .unwrap();
        enroll(&pool, a.id.into_inner(), "1001", true).await;
        enroll(&pool, a.id.into_inner(), "1002", false).await;

        let all = TrainingService::get_trainings(&pool, TrainingFilterParams::default())
            .await
            .unwrap();
        assert_eq!(all.meta.total, 2);
        assert_eq!(all.data[0].training.code, "TR-A");
        assert_eq!(all.data[0].enrollment_count, 2);
        assert_eq!(all.data[0].certificate_count, 1);
        assert_eq!(all.data[0].course_name, "Trabajo en alturas");
        assert_eq!(all.data[1].enrollment_count, 0);

        let upcoming = TrainingService::get_trainings(
            &pool,
            TrainingFilterParams {
                from: Some(Utc::now()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(upcoming.meta.total, 1);
        assert_eq!(upcoming.data[0].training.code, "TR-B");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_delete_removes_enrollments_and_files(pool: PgPool) {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path().to_path_buf(), "http://localhost/files".into());

        let id = training(&pool, Utc::now() - Duration::days(1)).await;
        enroll(&pool, id, "1001", true).await;
        storage.save("certificates/1001.pdf", b"%PDF-1.4").await.unwrap();

        TrainingService::delete_training(&pool, &storage, id).await.unwrap();

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM enrollments")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
        assert!(!dir.path().join("certificates/1001.pdf").exists());

        let err = TrainingService::delete_training(&pool, &storage, id)
            .await
            .unwrap_err();
        assert_eq!(err.status.as_u16(), 404);
    }
}
