use std::sync::Arc;

use heightcert_config::{CorsConfig, JwtConfig, RateLimitConfig, StorageConfig};
use heightcert_core::{FileStorage, LocalFileStorage};
use heightcert_db::{DbInitError, PgPool, init_db_pool, run_migrations};

use crate::middleware::rate_limit::RateLimiters;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
    pub rate_limit_config: RateLimitConfig,
    pub rate_limiters: RateLimiters,
    pub storage_config: StorageConfig,
    pub storage: Arc<dyn FileStorage>,
}

impl AppState {
    pub fn new(
        db: PgPool,
        jwt_config: JwtConfig,
        cors_config: CorsConfig,
        rate_limit_config: RateLimitConfig,
        storage_config: StorageConfig,
    ) -> Self {
        let storage = Arc::new(LocalFileStorage::with_max_size(
            storage_config.base_dir.clone(),
            storage_config.base_url.clone(),
            storage_config.max_file_size,
        ));

        Self {
            db,
            jwt_config,
            cors_config,
            rate_limiters: RateLimiters::new(&rate_limit_config),
            rate_limit_config,
            storage_config,
            storage,
        }
    }
}

pub async fn init_app_state() -> Result<AppState, DbInitError> {
    let db = init_db_pool().await?;
    run_migrations(&db).await?;

    Ok(AppState::new(
        db,
        JwtConfig::from_env(),
        CorsConfig::from_env(),
        RateLimitConfig::from_env(),
        StorageConfig::from_env(),
    ))
}
