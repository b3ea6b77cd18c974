//! Enrollments link a collaborator to a training and carry the certificate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::ids::{CollaboratorId, EnrollmentId, TrainingId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub training_id: TrainingId,
    pub collaborator_id: CollaboratorId,
    pub certificate_issued: bool,
    pub certificate_number: Option<String>,
    /// Storage key of the uploaded document
    pub certificate_path: Option<String>,
    pub issued_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct EnrollmentView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub enrollment: Enrollment,
    pub collaborator_name: String,
    pub document_number: String,
    /// Public URL of the certificate document, if one was uploaded
    #[sqlx(skip)]
    pub certificate_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateEnrollmentDto {
    pub collaborator_id: CollaboratorId,
}

/// OpenAPI description of the multipart certificate upload.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct CertificateUploadForm {
    /// PDF, PNG or JPEG
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    /// Generated as `CERT-<training code>-<hex>` when omitted
    pub certificate_number: Option<String>,
}
