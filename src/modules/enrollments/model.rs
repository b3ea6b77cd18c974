pub use heightcert_models::enrollments::*;

/// Parsed multipart certificate upload.
#[derive(Debug)]
pub struct CertificateUpload {
    pub content_type: String,
    pub bytes: Vec<u8>,
    pub certificate_number: Option<String>,
}
