use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use heightcert_core::AppError;

use super::model::{CertificateUpload, CertificateUploadForm, CreateEnrollmentDto, EnrollmentView};
use super::service::EnrollmentService;
use crate::middleware::auth::{AuthUser, RequireManageTrainings, RequireUploadDocuments};
use crate::state::AppState;
use crate::validator::ValidatedJson;

const MAX_CERTIFICATE_NUMBER_LEN: usize = 50;

#[utoipa::path(
    get,
    path = "/api/trainings/{id}/enrollments",
    params(("id" = Uuid, Path, description = "Training ID")),
    responses(
        (status = 200, description = "Enrollments of the training", body = Vec<EnrollmentView>),
        (status = 404, description = "Training not found")
    ),
    tag = "Enrollments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth))]
pub async fn get_enrollments(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(training_id): Path<Uuid>,
) -> Result<Json<Vec<EnrollmentView>>, AppError> {
    let views =
        EnrollmentService::get_training_enrollments(&state.db, state.storage.as_ref(), training_id)
            .await?;
    Ok(Json(views))
}

#[utoipa::path(
    post,
    path = "/api/trainings/{id}/enrollments",
    params(("id" = Uuid, Path, description = "Training ID")),
    request_body = CreateEnrollmentDto,
    responses(
        (status = 201, description = "Collaborator enrolled", body = EnrollmentView),
        (status = 400, description = "Collaborator does not exist"),
        (status = 403, description = "Forbidden - requires MANAGE_TRAININGS"),
        (status = 404, description = "Training not found"),
        (status = 409, description = "Collaborator already enrolled")
    ),
    tag = "Enrollments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth))]
pub async fn create_enrollment(
    State(state): State<AppState>,
    RequireManageTrainings(_auth): RequireManageTrainings,
    Path(training_id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<CreateEnrollmentDto>,
) -> Result<(StatusCode, Json<EnrollmentView>), AppError> {
    let view =
        EnrollmentService::enroll(&state.db, training_id, dto.collaborator_id.into_inner()).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

#[utoipa::path(
    delete,
    path = "/api/enrollments/{id}",
    params(("id" = Uuid, Path, description = "Enrollment ID")),
    responses(
        (status = 204, description = "Enrollment removed"),
        (status = 403, description = "Forbidden - requires MANAGE_TRAININGS"),
        (status = 404, description = "Enrollment not found")
    ),
    tag = "Enrollments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_enrollment(
    State(state): State<AppState>,
    RequireManageTrainings(auth_user): RequireManageTrainings,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    EnrollmentService::delete_enrollment(&state.db, state.storage.as_ref(), id).await?;

    crate::audit_event!(
        "enrollment_deleted",
        "enrollment",
        actor.email = %auth_user.email(),
        enrollment.id = %id,
        "Enrollment removed"
    );

    Ok(StatusCode::NO_CONTENT)
}

async fn read_upload(mut multipart: Multipart) -> Result<CertificateUpload, AppError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut certificate_number = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    AppError::bad_request(anyhow::anyhow!("Failed to read file: {}", e))
                })?;
                file = Some((content_type, bytes.to_vec()));
            }
            "certificate_number" => {
                let text = field.text().await.map_err(|e| {
                    AppError::bad_request(anyhow::anyhow!("Invalid certificate_number: {}", e))
                })?;
                let text = text.trim();
                if text.len() > MAX_CERTIFICATE_NUMBER_LEN {
                    return Err(AppError::unprocessable(anyhow::anyhow!(
                        "certificate_number must be at most {} characters",
                        MAX_CERTIFICATE_NUMBER_LEN
                    )));
                }
                if !text.is_empty() {
                    certificate_number = Some(text.to_string());
                }
            }
            _ => {}
        }
    }

    let (content_type, bytes) =
        file.ok_or_else(|| AppError::bad_request(anyhow::anyhow!("file is required")))?;
    if bytes.is_empty() {
        return Err(AppError::bad_request(anyhow::anyhow!("file is empty")));
    }

    Ok(CertificateUpload {
        content_type,
        bytes,
        certificate_number,
    })
}

/// Upload a certificate document
///
/// Marks the enrollment as certified. A previously uploaded document is
/// replaced.
#[utoipa::path(
    post,
    path = "/api/enrollments/{id}/certificate",
    params(("id" = Uuid, Path, description = "Enrollment ID")),
    request_body(content = CertificateUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Certificate stored", body = EnrollmentView),
        (status = 400, description = "Missing, oversized or unsupported file"),
        (status = 403, description = "Forbidden - requires UPLOAD_DOCUMENTS"),
        (status = 404, description = "Enrollment not found"),
        (status = 409, description = "Certificate number already in use")
    ),
    tag = "Enrollments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, multipart))]
pub async fn upload_certificate(
    State(state): State<AppState>,
    RequireUploadDocuments(auth_user): RequireUploadDocuments,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<EnrollmentView>, AppError> {
    let upload = read_upload(multipart).await?;
    let view =
        EnrollmentService::issue_certificate(&state.db, state.storage.as_ref(), id, upload).await?;

    crate::audit_event!(
        "certificate_issued",
        "enrollment",
        actor.email = %auth_user.email(),
        enrollment.id = %id,
        certificate.number = view.enrollment.certificate_number.as_deref().unwrap_or(""),
        "Certificate document uploaded"
    );

    Ok(Json(view))
}
