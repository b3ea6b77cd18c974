//! # heightcert Config
//!
//! Configuration loaded from environment variables. Every value has a default
//! so a bare development checkout starts without a `.env` file.
//!
//! - [`jwt`]: token signing secret and lifetimes
//! - [`cors`]: allowed browser origins
//! - [`rate_limit`]: per-IP limits for general and auth routes
//! - [`storage`]: where certificate documents are written
//! - [`server`]: bind address and metrics port
//!
//! ```ignore
//! use heightcert_config::{CorsConfig, JwtConfig, RateLimitConfig, ServerConfig, StorageConfig};
//!
//! let jwt_config = JwtConfig::from_env();
//! let server = ServerConfig::from_env();
//! ```

pub mod cors;
pub mod jwt;
pub mod rate_limit;
pub mod server;
pub mod storage;

pub use cors::CorsConfig;
pub use jwt::JwtConfig;
pub use rate_limit::RateLimitConfig;
pub use server::ServerConfig;
pub use storage::StorageConfig;

/// Reads `key` and parses it, falling back to `default` when unset or invalid.
pub(crate) fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring unparseable environment value");
            default
        }),
        Err(_) => default,
    }
}
