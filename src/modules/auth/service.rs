use sqlx::PgPool;
use tracing::{field::Empty, info, instrument};
use uuid::Uuid;

use heightcert_auth::jwt::{create_access_token, create_refresh_token, verify_refresh_token};
use heightcert_config::JwtConfig;
use heightcert_core::{AppError, verify_password};
use heightcert_models::{User, UserCredentials};

use super::model::{LoginRequest, LoginResponse, MeResponse, RefreshTokenResponse};
use crate::metrics::{track_jwt_issued, track_user_login_failure, track_user_login_success};
use crate::middleware::auth::AuthUser;
use crate::utils::tracing::{record_auth_result, record_user_id};

const USER_COLUMNS: &str =
    "id, first_name, last_name, email, role, is_active, created_at, updated_at";

pub struct AuthService;

impl AuthService {
    async fn find_user(db: &PgPool, user_id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    #[instrument(skip(db, dto, jwt_config), fields(user.email = %dto.email, user.id = Empty, auth.success = Empty))]
    pub async fn login_user(
        db: &PgPool,
        dto: LoginRequest,
        jwt_config: &JwtConfig,
    ) -> Result<LoginResponse, AppError> {
        let credentials = sqlx::query_as::<_, UserCredentials>(
            "SELECT id, email, password, role, is_active FROM users WHERE email = $1",
        )
        .bind(dto.email.trim().to_lowercase())
        .fetch_optional(db)
        .await?;

        let Some(credentials) = credentials else {
            record_auth_result(false);
            track_user_login_failure("unknown_email");
            crate::security_event!("login_failed", reason = "unknown_email", "Login failed");
            return Err(AppError::unauthorized("Invalid email or password"));
        };

        if !verify_password(&dto.password, &credentials.password)? {
            record_auth_result(false);
            track_user_login_failure("invalid_password");
            crate::security_event!(
                "login_failed",
                user.id = %credentials.id,
                reason = "invalid_password",
                "Login failed"
            );
            return Err(AppError::unauthorized("Invalid email or password"));
        }

        if !credentials.is_active {
            record_auth_result(false);
            track_user_login_failure("inactive");
            crate::security_event!(
                "login_failed",
                user.id = %credentials.id,
                reason = "inactive",
                "Login refused for disabled account"
            );
            return Err(AppError::forbidden("Account is disabled"));
        }

        let user_id = credentials.id.into_inner();
        let access_token =
            create_access_token(user_id, &credentials.email, credentials.role, jwt_config)?;
        let refresh_token = create_refresh_token(user_id, &credentials.email, jwt_config)?;
        track_jwt_issued();

        let user = Self::find_user(db, user_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid email or password"))?;

        record_user_id(&user_id.to_string());
        record_auth_result(true);
        track_user_login_success(credentials.role.as_str());
        info!(user.role = %credentials.role, "User logged in");

        Ok(LoginResponse {
            access_token,
            refresh_token,
            user,
        })
    }

    /// Issues a fresh access token. The role is re-read from the database so
    /// a demoted user does not keep the old role past the access token's life.
    #[instrument(skip_all, fields(user.id = Empty))]
    pub async fn refresh_access_token(
        db: &PgPool,
        refresh_token: &str,
        jwt_config: &JwtConfig,
    ) -> Result<RefreshTokenResponse, AppError> {
        let claims = verify_refresh_token(refresh_token, jwt_config)?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::unauthorized("Invalid or expired refresh token"))?;
        record_user_id(&claims.sub);

        let user = Self::find_user(db, user_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid or expired refresh token"))?;

        if !user.is_active {
            crate::security_event!(
                "refresh_denied",
                user.id = %user.id,
                reason = "inactive",
                "Refresh refused for disabled account"
            );
            return Err(AppError::forbidden("Account is disabled"));
        }

        let access_token = create_access_token(user_id, &user.email, user.role, jwt_config)?;
        track_jwt_issued();

        Ok(RefreshTokenResponse { access_token })
    }

    #[instrument(skip(db))]
    pub async fn me(db: &PgPool, auth_user: &AuthUser) -> Result<MeResponse, AppError> {
        let user_id = auth_user.user_id()?;
        let user = Self::find_user(db, user_id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))?;

        // Flags follow the token's role, which is what every other route checks.
        Ok(MeResponse::new(user, auth_user.role()))
    }
}
