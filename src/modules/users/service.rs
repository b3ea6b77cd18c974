use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use heightcert_core::{AppError, PaginationMeta, Role, hash_password};

use super::model::{CreateUserDto, PaginatedUsersResponse, User, UserFilterParams};
use crate::metrics::track_user_created;
use crate::utils::db_errors::map_write_error;
use crate::utils::search::contains_pattern;

const USER_COLUMNS: &str =
    "id, first_name, last_name, email, role, is_active, created_at, updated_at";

pub struct UserService;

impl UserService {
    #[instrument(skip(db, dto), fields(db.operation = "INSERT", db.table = "users"))]
    pub async fn create_user(db: &PgPool, dto: CreateUserDto) -> Result<User, AppError> {
        let password = hash_password(&dto.password)?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"INSERT INTO users (first_name, last_name, email, password, role)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(dto.first_name.trim())
        .bind(dto.last_name.trim())
        .bind(dto.email.trim().to_lowercase())
        .bind(password)
        .bind(dto.role.as_str())
        .fetch_one(db)
        .await
        .map_err(|e| map_write_error(e, "A user with this email already exists", "Invalid reference"))?;

        track_user_created(user.role.as_str());
        Ok(user)
    }

    #[instrument(skip(db, filters), fields(db.operation = "SELECT", db.table = "users"))]
    pub async fn get_users(
        db: &PgPool,
        filters: UserFilterParams,
    ) -> Result<PaginatedUsersResponse, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();

        let mut where_clause = String::from(" WHERE 1=1");
        let mut params: Vec<String> = Vec::new();

        if let Some(search) = &filters.search {
            params.push(contains_pattern(search));
            let n = params.len();
            where_clause.push_str(&format!(
                " AND (first_name ILIKE ${n} ESCAPE '\\' OR last_name ILIKE ${n} ESCAPE '\\' OR email ILIKE ${n} ESCAPE '\\')"
            ));
        }
        if let Some(role) = filters.role {
            params.push(role.as_str().to_string());
            where_clause.push_str(&format!(" AND role = ${}", params.len()));
        }
        if let Some(is_active) = filters.is_active {
            params.push(is_active.to_string());
            where_clause.push_str(&format!(" AND is_active = ${}::boolean", params.len()));
        }

        let count_query = format!("SELECT COUNT(*) FROM users{where_clause}");
        let mut count_sql = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_sql = count_sql.bind(param);
        }
        let total = count_sql.fetch_one(db).await?;

        let data_query = format!(
            "SELECT {USER_COLUMNS} FROM users{where_clause} ORDER BY last_name, first_name, id LIMIT {limit} OFFSET {offset}"
        );
        let mut data_sql = sqlx::query_as::<_, User>(&data_query);
        for param in params {
            data_sql = data_sql.bind(param);
        }
        let users = data_sql.fetch_all(db).await?;

        Ok(PaginatedUsersResponse {
            data: users,
            meta: PaginationMeta::new(&filters.pagination, total),
        })
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "users"))]
    pub async fn get_user(db: &PgPool, id: Uuid) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))
    }

    /// Returns the previous role together with the updated user.
    #[instrument(skip(db), fields(db.operation = "UPDATE", db.table = "users"))]
    pub async fn change_role(db: &PgPool, id: Uuid, role: Role) -> Result<(Role, User), AppError> {
        let previous = Self::get_user(db, id).await?.role;

        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(role.as_str())
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))?;

        Ok((previous, user))
    }
}
