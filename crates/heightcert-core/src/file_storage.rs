//! Storage for uploaded certificate documents.
//!
//! Services hold an `Arc<dyn FileStorage>` so the local backend can be
//! replaced without touching business logic.
//!
//! ```ignore
//! let storage = LocalFileStorage::new(PathBuf::from("./storage/uploads"), "http://localhost:3000/files".into());
//! storage.validate_upload("application/pdf", bytes.len())?;
//! let key = storage.save("certificates/abc-1718000000000.pdf", &bytes).await?;
//! let url = storage.get_url(&key)?;
//! storage.delete(&key).await?;
//! ```

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use tokio::fs;

pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

pub const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// MIME types accepted for certificates, with the extension stored on disk.
pub const CERTIFICATE_MIME_TYPES: &[(&str, &str)] = &[
    ("application/pdf", "pdf"),
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
];

pub trait FileStorage: Send + Sync {
    /// Stores `content` under `key` and returns the key.
    fn save<'a>(&'a self, key: &'a str, content: &'a [u8]) -> StorageFuture<'a, String>;

    /// Removes the file. A missing file is not an error.
    fn delete<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()>;

    fn get_url(&self, key: &str) -> Result<String, StorageError>;

    /// Checks size and MIME type before anything is written.
    fn validate_upload(&self, content_type: &str, len: usize) -> Result<(), StorageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("File exceeds maximum size of {max_bytes} bytes")]
    InvalidFileSize { max_bytes: usize },

    #[error("MIME type '{received}' not allowed. Allowed types: {}", allowed.join(", "))]
    InvalidMimeType {
        received: String,
        allowed: Vec<String>,
    },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

impl StorageError {
    /// Upload problems the client can fix, as opposed to server-side failures.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, StorageError::IoError(_))
    }
}

/// File extension for an accepted certificate MIME type.
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    CERTIFICATE_MIME_TYPES
        .iter()
        .find(|(mime, _)| *mime == content_type)
        .map(|(_, ext)| *ext)
}

#[derive(Clone)]
pub struct LocalFileStorage {
    base_dir: PathBuf,
    base_url: String,
    max_file_size: usize,
    allowed_mime_types: Vec<String>,
}

impl LocalFileStorage {
    pub fn new(base_dir: PathBuf, base_url: String) -> Self {
        Self::with_max_size(base_dir, base_url, DEFAULT_MAX_FILE_SIZE)
    }

    pub fn with_max_size(base_dir: PathBuf, base_url: String, max_file_size: usize) -> Self {
        Self {
            base_dir,
            base_url,
            max_file_size,
            allowed_mime_types: CERTIFICATE_MIME_TYPES
                .iter()
                .map(|(mime, _)| mime.to_string())
                .collect(),
        }
    }

    fn validate_key(key: &str) -> Result<(), StorageError> {
        if key.is_empty() || key.contains("..") || key.starts_with('/') || key.starts_with('\\') {
            return Err(StorageError::InvalidKey(
                "Key must not be empty, contain '..', or start with a separator".to_string(),
            ));
        }

        if !key
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '/' | '.'))
        {
            return Err(StorageError::InvalidKey(
                "Key contains invalid characters".to_string(),
            ));
        }

        Ok(())
    }
}

impl FileStorage for LocalFileStorage {
    fn save<'a>(&'a self, key: &'a str, content: &'a [u8]) -> StorageFuture<'a, String> {
        Box::pin(async move {
            Self::validate_key(key)?;

            if content.len() > self.max_file_size {
                return Err(StorageError::InvalidFileSize {
                    max_bytes: self.max_file_size,
                });
            }

            let file_path = self.base_dir.join(key);
            if let Some(parent) = file_path.parent() {
                fs::create_dir_all(parent).await?;
            }
            fs::write(&file_path, content).await?;

            Ok(key.to_string())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            Self::validate_key(key)?;

            match fs::remove_file(self.base_dir.join(key)).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            }
        })
    }

    fn get_url(&self, key: &str) -> Result<String, StorageError> {
        Self::validate_key(key)?;
        Ok(format!("{}/{}", self.base_url.trim_end_matches('/'), key))
    }

    fn validate_upload(&self, content_type: &str, len: usize) -> Result<(), StorageError> {
        if len > self.max_file_size {
            return Err(StorageError::InvalidFileSize {
                max_bytes: self.max_file_size,
            });
        }
        if !self.allowed_mime_types.iter().any(|m| m == content_type) {
            return Err(StorageError::InvalidMimeType {
                received: content_type.to_string(),
                allowed: self.allowed_mime_types.clone(),
            });
        }
        Ok(())
    }
}
