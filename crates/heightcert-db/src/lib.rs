//! # heightcert DB
//!
//! PostgreSQL pool construction and embedded migrations.
//!
//! ```ignore
//! let pool = heightcert_db::init_db_pool().await?;
//! heightcert_db::run_migrations(&pool).await?;
//! ```

use std::env;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

pub use sqlx::PgPool;

#[derive(Debug)]
pub enum DbInitError {
    MissingUrl,
    Connect(sqlx::Error),
    Migrate(sqlx::migrate::MigrateError),
}

impl std::fmt::Display for DbInitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingUrl => write!(f, "DATABASE_URL must be set"),
            Self::Connect(e) => write!(f, "Failed to connect to database: {e}"),
            Self::Migrate(e) => write!(f, "Failed to run migrations: {e}"),
        }
    }
}

impl std::error::Error for DbInitError {}

/// Connects using `DATABASE_URL`, sized by `DATABASE_MAX_CONNECTIONS`
/// (default 10).
pub async fn init_db_pool() -> Result<PgPool, DbInitError> {
    let database_url = env::var("DATABASE_URL").map_err(|_| DbInitError::MissingUrl)?;
    let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(10);

    connect(&database_url, max_connections).await
}

pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, DbInitError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
        .map_err(DbInitError::Connect)?;

    tracing::info!(max_connections, "Database pool ready");
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), DbInitError> {
    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(DbInitError::Migrate)?;
    tracing::info!("Migrations applied");
    Ok(())
}
