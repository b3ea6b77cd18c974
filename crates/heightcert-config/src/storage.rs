use std::env;
use std::path::PathBuf;

use crate::env_or;

/// Where uploaded certificates live and how they are served back.
#[derive(Clone, Debug)]
pub struct StorageConfig {
    /// `STORAGE_DIR`, default `./storage/uploads`
    pub base_dir: PathBuf,
    /// `STORAGE_BASE_URL`, default `http://localhost:3000/files`
    pub base_url: String,
    /// `STORAGE_MAX_FILE_SIZE` in bytes, default 10 MiB
    pub max_file_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("./storage/uploads"),
            base_url: "http://localhost:3000/files".to_string(),
            max_file_size: 10 * 1024 * 1024,
        }
    }
}

impl StorageConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_dir: env::var("STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.base_dir),
            base_url: env::var("STORAGE_BASE_URL").unwrap_or(defaults.base_url),
            max_file_size: env_or("STORAGE_MAX_FILE_SIZE", defaults.max_file_size),
        }
    }
}
