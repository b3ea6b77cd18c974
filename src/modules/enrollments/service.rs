use rand::Rng;
use sqlx::PgPool;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use heightcert_core::file_storage::extension_for;
use heightcert_core::{AppError, FileStorage, StorageError};

use super::model::{CertificateUpload, EnrollmentView};
use crate::metrics::track_certificate_issued;
use crate::utils::db_errors::map_write_error;
use crate::utils::tracing::ErrorExt;

const VIEW_SELECT: &str = r#"SELECT
        e.*,
        c.first_name || ' ' || c.last_name AS collaborator_name,
        c.document_number
    FROM enrollments e
    JOIN collaborators c ON c.id = e.collaborator_id"#;

/// `CERT-<training code>-<6 uppercase hex digits>`
pub fn generate_certificate_number(training_code: &str) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..0x100_0000);
    format!("CERT-{}-{:06X}", training_code, suffix)
}

fn storage_error(e: StorageError) -> AppError {
    if e.is_client_error() {
        AppError::bad_request(e)
    } else {
        AppError::internal(e)
    }
}

pub struct EnrollmentService;

impl EnrollmentService {
    fn with_url(storage: &dyn FileStorage, mut view: EnrollmentView) -> EnrollmentView {
        view.certificate_url = view
            .enrollment
            .certificate_path
            .as_deref()
            .and_then(|path| storage.get_url(path).ok());
        view
    }

    async fn get_view(db: &PgPool, id: Uuid) -> Result<Option<EnrollmentView>, AppError> {
        let view = sqlx::query_as::<_, EnrollmentView>(&format!("{VIEW_SELECT} WHERE e.id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(view)
    }

    async fn ensure_training_exists(db: &PgPool, training_id: Uuid) -> Result<String, AppError> {
        sqlx::query_scalar::<_, String>("SELECT code FROM trainings WHERE id = $1")
            .bind(training_id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Training not found")))
    }

    #[instrument(skip(db, storage), fields(db.operation = "SELECT", db.table = "enrollments"))]
    pub async fn get_enrollments(
        db: &PgPool,
        storage: &dyn FileStorage,
        training_id: Uuid,
    ) -> Result<Vec<EnrollmentView>, AppError> {
        let views = sqlx::query_as::<_, EnrollmentView>(&format!(
            "{VIEW_SELECT} WHERE e.training_id = $1 ORDER BY c.last_name, c.first_name, e.id"
        ))
        .bind(training_id)
        .fetch_all(db)
        .await?;

        Ok(views
            .into_iter()
            .map(|view| Self::with_url(storage, view))
            .collect())
    }

    /// Lists enrollments of a training that must exist.
    pub async fn get_training_enrollments(
        db: &PgPool,
        storage: &dyn FileStorage,
        training_id: Uuid,
    ) -> Result<Vec<EnrollmentView>, AppError> {
        Self::ensure_training_exists(db, training_id).await?;
        Self::get_enrollments(db, storage, training_id).await
    }

    #[instrument(skip(db), fields(db.operation = "INSERT", db.table = "enrollments"))]
    pub async fn enroll(
        db: &PgPool,
        training_id: Uuid,
        collaborator_id: Uuid,
    ) -> Result<EnrollmentView, AppError> {
        Self::ensure_training_exists(db, training_id).await?;

        let id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO enrollments (training_id, collaborator_id) VALUES ($1, $2) RETURNING id",
        )
        .bind(training_id)
        .bind(collaborator_id)
        .fetch_one(db)
        .await
        .map_err(|e| {
            map_write_error(
                e,
                "Collaborator is already enrolled in this training",
                "Collaborator does not exist",
            )
        })?;

        Self::get_view(db, id)
            .await?
            .ok_or_else(|| AppError::internal_error("Enrollment vanished after insert"))
    }

    /// Removes the enrollment and its certificate document, if any.
    #[instrument(skip(db, storage), fields(db.operation = "DELETE", db.table = "enrollments"))]
    pub async fn delete_enrollment(
        db: &PgPool,
        storage: &dyn FileStorage,
        id: Uuid,
    ) -> Result<(), AppError> {
        let path = sqlx::query_scalar::<_, Option<String>>(
            "DELETE FROM enrollments WHERE id = $1 RETURNING certificate_path",
        )
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Enrollment not found")))?;

        if let Some(path) = path {
            let _ = storage
                .delete(&path)
                .await
                .log_error("deleting certificate of removed enrollment");
        }
        Ok(())
    }

    /// Stores the certificate document and marks the enrollment certified.
    ///
    /// The number is taken from the upload, else kept from a previous upload,
    /// else generated. A replaced document is deleted once the row points at
    /// the new one.
    #[instrument(skip(db, storage, upload), fields(enrollment.id = %id, file.size = upload.bytes.len(), db.operation = "UPDATE", db.table = "enrollments"))]
    pub async fn issue_certificate(
        db: &PgPool,
        storage: &dyn FileStorage,
        id: Uuid,
        upload: CertificateUpload,
    ) -> Result<EnrollmentView, AppError> {
        let current = Self::get_view(db, id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Enrollment not found")))?;

        storage
            .validate_upload(&upload.content_type, upload.bytes.len())
            .map_err(storage_error)?;
        let ext = extension_for(&upload.content_type).ok_or_else(|| {
            AppError::bad_request(anyhow::anyhow!(
                "Unsupported certificate type '{}'",
                upload.content_type
            ))
        })?;

        let certificate_number = match upload.certificate_number {
            Some(number) => number,
            None => match current.enrollment.certificate_number.clone() {
                Some(existing) => existing,
                None => {
                    let code = Self::ensure_training_exists(
                        db,
                        current.enrollment.training_id.into_inner(),
                    )
                    .await?;
                    generate_certificate_number(&code)
                }
            },
        };

        let storage_key = format!(
            "certificates/{}-{}.{}",
            id,
            chrono::Utc::now().timestamp_millis(),
            ext
        );
        debug!(storage_key = %storage_key, "Saving certificate document");

        storage
            .save(&storage_key, &upload.bytes)
            .await
            .map_err(|e| {
                error!(enrollment.id = %id, error = %e, "Failed to save certificate document");
                storage_error(e)
            })?;

        let updated = sqlx::query(
            r#"UPDATE enrollments SET
                   certificate_issued = TRUE,
                   certificate_number = $2,
                   certificate_path = $3,
                   issued_at = NOW()
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(&certificate_number)
        .bind(&storage_key)
        .execute(db)
        .await;

        if let Err(e) = updated {
            let _ = storage
                .delete(&storage_key)
                .await
                .log_error("removing orphaned certificate document");
            return Err(map_write_error(
                e,
                "Certificate number is already in use",
                "Invalid reference",
            ));
        }

        if let Some(old_path) = current.enrollment.certificate_path.as_deref()
            && old_path != storage_key
        {
            let _ = storage
                .delete(old_path)
                .await
                .log_error("deleting replaced certificate document");
        }

        track_certificate_issued();
        info!(enrollment.id = %id, certificate.number = %certificate_number, "Certificate issued");

        let view = Self::get_view(db, id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Enrollment not found")))?;
        Ok(Self::with_url(storage, view))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heightcert_core::LocalFileStorage;

    struct Fixture {
        training_id: Uuid,
        collaborator_id: Uuid,
    }

    async fn fixture(db: &PgPool) -> Fixture {
        let course_id: Uuid = sqlx::query_scalar(
            "INSERT INTO courses (code, name, duration_hours, validity_months)
             VALUES ('TSA', 'Trabajo en alturas', 40, 12) RETURNING id",
        )
        .fetch_one(db)
        .await
        .unwrap();
        let training_id: Uuid = sqlx::query_scalar(
            "INSERT INTO trainings (code, course_id, start_date) VALUES ('TR-7', $1, NOW()) RETURNING id",
        )
        .bind(course_id)
        .fetch_one(db)
        .await
        .unwrap();
        let collaborator_id: Uuid = sqlx::query_scalar(
            "INSERT INTO collaborators (document_number, first_name, last_name)
             VALUES ('1032456789', 'Luis', 'Gómez') RETURNING id",
        )
        .fetch_one(db)
        .await
        .unwrap();
        Fixture {
            training_id,
            collaborator_id,
        }
    }

    fn pdf(number: Option<&str>) -> CertificateUpload {
        CertificateUpload {
            content_type: "application/pdf".to_string(),
            bytes: b"%PDF-1.4 test".to_vec(),
            certificate_number: number.map(str::to_string),
        }
    }

    #[test]
    fn test_generated_certificate_number_format() {
        let number = generate_certificate_number("TR-7");
        assert!(number.starts_with("CERT-TR-7-"));
        let suffix = number.trim_start_matches("CERT-TR-7-");
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_enroll_twice_is_conflict(pool: PgPool) {
        let f = fixture(&pool).await;
        let view = EnrollmentService::enroll(&pool, f.training_id, f.collaborator_id)
            .await
            .unwrap();
        assert_eq!(view.collaborator_name, "Luis Gómez");
        assert!(!view.enrollment.certificate_issued);

        let err = EnrollmentService::enroll(&pool, f.training_id, f.collaborator_id)
            .await
            .unwrap_err();
        assert_eq!(err.status.as_u16(), 409);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_enroll_unknown_references(pool: PgPool) {
        let f = fixture(&pool).await;
        let err = EnrollmentService::enroll(&pool, Uuid::new_v4(), f.collaborator_id)
            .await
            .unwrap_err();
        assert_eq!(err.status.as_u16(), 404);

        let err = EnrollmentService::enroll(&pool, f.training_id, Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.status.as_u16(), 400);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_issue_certificate_generates_number_and_replaces_file(pool: PgPool) {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path().to_path_buf(), "http://localhost/files".into());
        let f = fixture(&pool).await;
        let id = EnrollmentService::enroll(&pool, f.training_id, f.collaborator_id)
            .await
            .unwrap()
            .enrollment
            .id
            .into_inner();

        let first = EnrollmentService::issue_certificate(&pool, &storage, id, pdf(None))
            .await
            .unwrap();
        assert!(first.enrollment.certificate_issued);
        assert!(first.enrollment.issued_at.is_some());
        let number = first.enrollment.certificate_number.clone().unwrap();
        assert!(number.starts_with("CERT-TR-7-"));
        let first_path = first.enrollment.certificate_path.clone().unwrap();
        assert!(dir.path().join(&first_path).exists());
        assert!(first.certificate_url.unwrap().ends_with(&first_path));

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = EnrollmentService::issue_certificate(&pool, &storage, id, pdf(None))
            .await
            .unwrap();
        // number survives a re-upload, the old document does not
        assert_eq!(second.enrollment.certificate_number.as_deref(), Some(number.as_str()));
        assert!(!dir.path().join(&first_path).exists());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_issue_certificate_rejects_bad_type(pool: PgPool) {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path().to_path_buf(), "http://localhost/files".into());
        let f = fixture(&pool).await;
        let id = EnrollmentService::enroll(&pool, f.training_id, f.collaborator_id)
            .await
            .unwrap()
            .enrollment
            .id
            .into_inner();

        let upload = CertificateUpload {
            content_type: "text/html".to_string(),
            ..pdf(None)
        };
        let err = EnrollmentService::issue_certificate(&pool, &storage, id, upload)
            .await
            .unwrap_err();
        assert_eq!(err.status.as_u16(), 400);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_delete_enrollment_removes_document(pool: PgPool) {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path().to_path_buf(), "http://localhost/files".into());
        let f = fixture(&pool).await;
        let id = EnrollmentService::enroll(&pool, f.training_id, f.collaborator_id)
            .await
            .unwrap()
            .enrollment
            .id
            .into_inner();
        let view = EnrollmentService::issue_certificate(&pool, &storage, id, pdf(Some("CERT-MANUAL-1")))
            .await
            .unwrap();
        assert_eq!(view.enrollment.certificate_number.as_deref(), Some("CERT-MANUAL-1"));
        let path = view.enrollment.certificate_path.unwrap();

        EnrollmentService::delete_enrollment(&pool, &storage, id).await.unwrap();
        assert!(!dir.path().join(path).exists());

        let err = EnrollmentService::delete_enrollment(&pool, &storage, id)
            .await
            .unwrap_err();
        assert_eq!(err.status.as_u16(), 404);
    }
}
