use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use heightcert_core::{AppError, PaginationMeta};

use super::model::{
    Collaborator, CollaboratorFilterParams, CreateCollaboratorDto, PaginatedCollaboratorsResponse,
    UpdateCollaboratorDto,
};
use crate::utils::db_errors::{map_delete_error, map_write_error};
use crate::utils::search::contains_pattern;

const DUPLICATE_DOCUMENT: &str = "A collaborator with this document number already exists";

pub struct CollaboratorService;

impl CollaboratorService {
    #[instrument(skip(db, dto), fields(db.operation = "INSERT", db.table = "collaborators"))]
    pub async fn create_collaborator(
        db: &PgPool,
        dto: CreateCollaboratorDto,
    ) -> Result<Collaborator, AppError> {
        sqlx::query_as::<_, Collaborator>(
            r#"INSERT INTO collaborators
                   (document_number, first_name, last_name, email, phone, position, is_active)
               VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, TRUE))
               RETURNING *"#,
        )
        .bind(dto.document_number.trim())
        .bind(dto.first_name.trim())
        .bind(dto.last_name.trim())
        .bind(&dto.email)
        .bind(&dto.phone)
        .bind(&dto.position)
        .bind(dto.is_active)
        .fetch_one(db)
        .await
        .map_err(|e| map_write_error(e, DUPLICATE_DOCUMENT, "Invalid reference"))
    }

    #[instrument(skip(db, filters), fields(db.operation = "SELECT", db.table = "collaborators"))]
    pub async fn get_collaborators(
        db: &PgPool,
        filters: CollaboratorFilterParams,
    ) -> Result<PaginatedCollaboratorsResponse, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();

        let mut where_clause = String::from(" WHERE 1=1");
        let mut params: Vec<String> = Vec::new();

        if let Some(search) = &filters.search {
            params.push(contains_pattern(search));
            let n = params.len();
            where_clause.push_str(&format!(
                " AND (document_number ILIKE ${n} ESCAPE '\\' OR first_name ILIKE ${n} ESCAPE '\\' OR last_name ILIKE ${n} ESCAPE '\\' OR email ILIKE ${n} ESCAPE '\\')"
            ));
        }
        if let Some(is_active) = filters.is_active {
            params.push(is_active.to_string());
            where_clause.push_str(&format!(" AND is_active = ${}::boolean", params.len()));
        }

        let count_query = format!("SELECT COUNT(*) FROM collaborators{where_clause}");
        let mut count_sql = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_sql = count_sql.bind(param);
        }
        let total = count_sql.fetch_one(db).await?;

        let data_query = format!(
            "SELECT * FROM collaborators{where_clause} ORDER BY {} {}, id LIMIT {limit} OFFSET {offset}",
            filters.sort_by.unwrap_or_default().column(),
            filters.sort_order.unwrap_or_default().as_sql(),
        );
        let mut data_sql = sqlx::query_as::<_, Collaborator>(&data_query);
        for param in params {
            data_sql = data_sql.bind(param);
        }
        let collaborators = data_sql.fetch_all(db).await?;

        Ok(PaginatedCollaboratorsResponse {
            data: collaborators,
            meta: PaginationMeta::new(&filters.pagination, total),
        })
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "collaborators"))]
    pub async fn get_collaborator(db: &PgPool, id: Uuid) -> Result<Collaborator, AppError> {
        sqlx::query_as::<_, Collaborator>("SELECT * FROM collaborators WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Collaborator not found")))
    }

    #[instrument(skip(db, dto), fields(db.operation = "UPDATE", db.table = "collaborators"))]
    pub async fn update_collaborator(
        db: &PgPool,
        id: Uuid,
        dto: UpdateCollaboratorDto,
    ) -> Result<Collaborator, AppError> {
        sqlx::query_as::<_, Collaborator>(
            r#"UPDATE collaborators SET
                   document_number = COALESCE($2, document_number),
                   first_name = COALESCE($3, first_name),
                   last_name = COALESCE($4, last_name),
                   email = COALESCE($5, email),
                   phone = COALESCE($6, phone),
                   position = COALESCE($7, position),
                   is_active = COALESCE($8, is_active),
                   updated_at = NOW()
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(id)
        .bind(dto.document_number.as_deref().map(str::trim))
        .bind(dto.first_name.as_deref().map(str::trim))
        .bind(dto.last_name.as_deref().map(str::trim))
        .bind(&dto.email)
        .bind(&dto.phone)
        .bind(&dto.position)
        .bind(dto.is_active)
        .fetch_optional(db)
        .await
        .map_err(|e| map_write_error(e, DUPLICATE_DOCUMENT, "Invalid reference"))?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Collaborator not found")))
    }

    #[instrument(skip(db), fields(db.operation = "DELETE", db.table = "collaborators"))]
    pub async fn delete_collaborator(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM collaborators WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .map_err(|e| {
                map_delete_error(
                    e,
                    "Collaborator is enrolled in trainings; remove the enrollments first",
                )
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Collaborator not found")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heightcert_models::CollaboratorSortBy;

    fn dto(document: &str, last_name: &str) -> CreateCollaboratorDto {
        CreateCollaboratorDto {
            document_number: document.to_string(),
            first_name: "Luis".to_string(),
            last_name: last_name.to_string(),
            email: None,
            phone: None,
            position: Some("Lineman".to_string()),
            is_active: None,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_defaults_to_active(pool: PgPool) {
        let c = CollaboratorService::create_collaborator(&pool, dto("1032456789", "Gómez"))
            .await
            .unwrap();
        assert!(c.is_active);
        assert_eq!(c.position.as_deref(), Some("Lineman"));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_duplicate_document_is_conflict(pool: PgPool) {
        CollaboratorService::create_collaborator(&pool, dto("1032456789", "Gómez"))
            .await
            .unwrap();
        let err = CollaboratorService::create_collaborator(&pool, dto("1032456789", "Pérez"))
            .await
            .unwrap_err();
        assert_eq!(err.status.as_u16(), 409);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_search_and_sort(pool: PgPool) {
        for (doc, last) in [("1001", "Zapata"), ("1002", "Arango"), ("2001", "Mejía")] {
            CollaboratorService::create_collaborator(&pool, dto(doc, last))
                .await
                .unwrap();
        }

        let filters = CollaboratorFilterParams {
            search: Some("100".to_string()),
            sort_by: Some(CollaboratorSortBy::LastName),
            ..Default::default()
        };
        let page = CollaboratorService::get_collaborators(&pool, filters)
            .await
            .unwrap();
        assert_eq!(page.meta.total, 2);
        assert_eq!(page.data[0].last_name, "Arango");
        assert_eq!(page.data[1].last_name, "Zapata");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_update_keeps_unset_fields(pool: PgPool) {
        let c = CollaboratorService::create_collaborator(&pool, dto("1032456789", "Gómez"))
            .await
            .unwrap();
        let updated = CollaboratorService::update_collaborator(
            &pool,
            c.id.into_inner(),
            UpdateCollaboratorDto {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(!updated.is_active);
        assert_eq!(updated.last_name, "Gómez");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_delete_missing_is_not_found(pool: PgPool) {
        let err = CollaboratorService::delete_collaborator(&pool, Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.status.as_u16(), 404);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_search_wildcards_match_literally(pool: PgPool) {
        CollaboratorService::create_collaborator(&pool, dto("2001", "Ruiz_Díaz"))
            .await
            .unwrap();
        CollaboratorService::create_collaborator(&pool, dto("2002", "Torres"))
            .await
            .unwrap();

        for (term, expected) in [("_", 1), ("%", 0), ("z_D", 1)] {
            let filters = CollaboratorFilterParams {
                search: Some(term.to_string()),
                ..Default::default()
            };
            let page = CollaboratorService::get_collaborators(&pool, filters)
                .await
                .unwrap();
            assert_eq!(page.meta.total, expected, "search {term:?}");
        }
    }
}
