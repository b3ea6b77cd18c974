use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use heightcert_core::{AppError, PaginationMeta};

use super::model::{
    Coach, CoachFilterParams, CreateCoachDto, PaginatedCoachesResponse, UpdateCoachDto,
};
use crate::utils::db_errors::map_write_error;
use crate::utils::search::contains_pattern;

const DUPLICATE_LICENSE: &str = "A coach with this license number already exists";

pub struct CoachService;

impl CoachService {
    #[instrument(skip(db, dto), fields(db.operation = "INSERT", db.table = "coaches"))]
    pub async fn create_coach(db: &PgPool, dto: CreateCoachDto) -> Result<Coach, AppError> {
        sqlx::query_as::<_, Coach>(
            r#"INSERT INTO coaches (first_name, last_name, email, phone, license_number, is_active)
               VALUES ($1, $2, $3, $4, $5, COALESCE($6, TRUE))
               RETURNING *"#,
        )
        .bind(dto.first_name.trim())
        .bind(dto.last_name.trim())
        .bind(&dto.email)
        .bind(&dto.phone)
        .bind(dto.license_number.as_deref().map(str::trim))
        .bind(dto.is_active)
        .fetch_one(db)
        .await
        .map_err(|e| map_write_error(e, DUPLICATE_LICENSE, "Invalid reference"))
    }

    #[instrument(skip(db, filters), fields(db.operation = "SELECT", db.table = "coaches"))]
    pub async fn get_coaches(
        db: &PgPool,
        filters: CoachFilterParams,
    ) -> Result<PaginatedCoachesResponse, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();

        let mut where_clause = String::from(" WHERE 1=1");
        let mut params: Vec<String> = Vec::new();

        if let Some(search) = &filters.search {
            params.push(contains_pattern(search));
            let n = params.len();
            where_clause.push_str(&format!(
                " AND (first_name ILIKE ${n} ESCAPE '\\' OR last_name ILIKE ${n} ESCAPE '\\' OR email ILIKE ${n} ESCAPE '\\' OR license_number ILIKE ${n} ESCAPE '\\')"
            ));
        }
        if let Some(is_active) = filters.is_active {
            params.push(is_active.to_string());
            where_clause.push_str(&format!(" AND is_active = ${}::boolean", params.len()));
        }

        let count_query = format!("SELECT COUNT(*) FROM coaches{where_clause}");
        let mut count_sql = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_sql = count_sql.bind(param);
        }
        let total = count_sql.fetch_one(db).await?;

        let data_query = format!(
            "SELECT * FROM coaches{where_clause} ORDER BY {} {}, id LIMIT {limit} OFFSET {offset}",
            filters.sort_by.unwrap_or_default().column(),
            filters.sort_order.unwrap_or_default().as_sql(),
        );
        let mut data_sql = sqlx::query_as::<_, Coach>(&data_query);
        for param in params {
            data_sql = data_sql.bind(param);
        }
        let coaches = data_sql.fetch_all(db).await?;

        Ok(PaginatedCoachesResponse {
            data: coaches,
            meta: PaginationMeta::new(&filters.pagination, total),
        })
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "coaches"))]
    pub async fn get_coach(db: &PgPool, id: Uuid) -> Result<Coach, AppError> {
        sqlx::query_as::<_, Coach>("SELECT * FROM coaches WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Coach not found")))
    }

    #[instrument(skip(db, dto), fields(db.operation = "UPDATE", db.table = "coaches"))]
    pub async fn update_coach(
        db: &PgPool,
        id: Uuid,
        dto: UpdateCoachDto,
    ) -> Result<Coach, AppError> {
        sqlx::query_as::<_, Coach>(
            r#"UPDATE coaches SET
                   first_name = COALESCE($2, first_name),
                   last_name = COALESCE($3, last_name),
                   email = COALESCE($4, email),
                   phone = COALESCE($5, phone),
                   license_number = COALESCE($6, license_number),
                   is_active = COALESCE($7, is_active),
                   updated_at = NOW()
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(id)
        .bind(dto.first_name.as_deref().map(str::trim))
        .bind(dto.last_name.as_deref().map(str::trim))
        .bind(&dto.email)
        .bind(&dto.phone)
        .bind(dto.license_number.as_deref().map(str::trim))
        .bind(dto.is_active)
        .fetch_optional(db)
        .await
        .map_err(|e| map_write_error(e, DUPLICATE_LICENSE, "Invalid reference"))?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Coach not found")))
    }

    #[instrument(skip(db), fields(db.operation = "DELETE", db.table = "coaches"))]
    pub async fn delete_coach(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM coaches WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Coach not found")));
        }
        Ok(())
    }
}
