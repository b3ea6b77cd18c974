//! Request processing shared by every feature module.
//!
//! - [`auth`]: `AuthUser` extractor and permission extractors
//! - [`role`]: route layers gating whole routers by role capability
//! - [`rate_limit`]: per-IP token buckets
//!
//! # Authentication flow
//!
//! 1. Client sends `Authorization: Bearer <token>`
//! 2. `AuthUser` verifies the JWT (401 on failure)
//! 3. A `Require*` extractor checks the role's permission (403 on failure)
//! 4. The handler runs
//!
//! ```ignore
//! async fn create_training(
//!     RequireManageTrainings(auth_user): RequireManageTrainings,
//!     ValidatedJson(dto): ValidatedJson<CreateTrainingDto>,
//! ) -> Result<(StatusCode, Json<Training>), AppError> { ... }
//! ```

pub mod auth;
pub mod rate_limit;
pub mod role;
