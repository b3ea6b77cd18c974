use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use heightcert_core::{AppError, PaginationMeta};

use super::model::{
    Course, CourseDetail, CourseFilterParams, CourseLevel, CreateCourseDto, CreateCourseLevelDto,
    PaginatedCoursesResponse, UpdateCourseDto,
};
use crate::utils::db_errors::{map_delete_error, map_write_error};
use crate::utils::search::contains_pattern;

const DUPLICATE_CODE: &str = "A course with this code already exists";

pub struct CourseService;

impl CourseService {
    #[instrument(skip(db, dto), fields(db.operation = "INSERT", db.table = "courses"))]
    pub async fn create_course(db: &PgPool, dto: CreateCourseDto) -> Result<Course, AppError> {
        sqlx::query_as::<_, Course>(
            r#"INSERT INTO courses (code, name, description, duration_hours, validity_months, is_active)
               VALUES ($1, $2, $3, $4, $5, COALESCE($6, TRUE))
               RETURNING *"#,
        )
        .bind(dto.code.trim().to_uppercase())
        .bind(dto.name.trim())
        .bind(&dto.description)
        .bind(dto.duration_hours)
        .bind(dto.validity_months)
        .bind(dto.is_active)
        .fetch_one(db)
        .await
        .map_err(|e| map_write_error(e, DUPLICATE_CODE, "Invalid reference"))
    }

    #[instrument(skip(db, filters), fields(db.operation = "SELECT", db.table = "courses"))]
    pub async fn get_courses(
        db: &PgPool,
        filters: CourseFilterParams,
    ) -> Result<PaginatedCoursesResponse, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();

        let mut where_clause = String::from(" WHERE 1=1");
        let mut params: Vec<String> = Vec::new();

        if let Some(search) = &filters.search {
            params.push(contains_pattern(search));
            let n = params.len();
            where_clause.push_str(&format!(" AND (code ILIKE ${n} ESCAPE '\\' OR name ILIKE ${n} ESCAPE '\\')"));
        }
        if let Some(is_active) = filters.is_active {
            params.push(is_active.to_string());
            where_clause.push_str(&format!(" AND is_active = ${}::boolean", params.len()));
        }

        let count_query = format!("SELECT COUNT(*) FROM courses{where_clause}");
        let mut count_sql = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_sql = count_sql.bind(param);
        }
        let total = count_sql.fetch_one(db).await?;

        let data_query = format!(
            "SELECT * FROM courses{where_clause} ORDER BY {} {}, id LIMIT {limit} OFFSET {offset}",
            filters.sort_by.unwrap_or_default().column(),
            filters.sort_order.unwrap_or_default().as_sql(),
        );
        let mut data_sql = sqlx::query_as::<_, Course>(&data_query);
        for param in params {
            data_sql = data_sql.bind(param);
        }
        let courses = data_sql.fetch_all(db).await?;

        Ok(PaginatedCoursesResponse {
            data: courses,
            meta: PaginationMeta::new(&filters.pagination, total),
        })
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "courses"))]
    pub async fn get_course(db: &PgPool, id: Uuid) -> Result<Course, AppError> {
        sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Course not found")))
    }

    pub async fn get_course_detail(db: &PgPool, id: Uuid) -> Result<CourseDetail, AppError> {
        let course = Self::get_course(db, id).await?;
        let levels = Self::get_levels(db, id).await?;
        Ok(CourseDetail { course, levels })
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "course_levels"))]
    pub async fn get_levels(db: &PgPool, course_id: Uuid) -> Result<Vec<CourseLevel>, AppError> {
        let levels = sqlx::query_as::<_, CourseLevel>(
            "SELECT * FROM course_levels WHERE course_id = $1 ORDER BY hours, name",
        )
        .bind(course_id)
        .fetch_all(db)
        .await?;
        Ok(levels)
    }

    #[instrument(skip(db, dto), fields(db.operation = "UPDATE", db.table = "courses"))]
    pub async fn update_course(
        db: &PgPool,
        id: Uuid,
        dto: UpdateCourseDto,
    ) -> Result<Course, AppError> {
        sqlx::query_as::<_, Course>(
            r#"UPDATE courses SET
                   code = COALESCE($2, code),
                   name = COALESCE($3, name),
                   description = COALESCE($4, description),
                   duration_hours = COALESCE($5, duration_hours),
                   validity_months = COALESCE($6, validity_months),
                   is_active = COALESCE($7, is_active),
                   updated_at = NOW()
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(id)
        .bind(dto.code.map(|c| c.trim().to_uppercase()))
        .bind(dto.name.as_deref().map(str::trim))
        .bind(&dto.description)
        .bind(dto.duration_hours)
        .bind(dto.validity_months)
        .bind(dto.is_active)
        .fetch_optional(db)
        .await
        .map_err(|e| map_write_error(e, DUPLICATE_CODE, "Invalid reference"))?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Course not found")))
    }

    #[instrument(skip(db), fields(db.operation = "DELETE", db.table = "courses"))]
    pub async fn delete_course(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .map_err(|e| map_delete_error(e, "Course is used by trainings and cannot be deleted"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Course not found")));
        }
        Ok(())
    }

    #[instrument(skip(db, dto), fields(db.operation = "INSERT", db.table = "course_levels"))]
    pub async fn create_level(
        db: &PgPool,
        course_id: Uuid,
        dto: CreateCourseLevelDto,
    ) -> Result<CourseLevel, AppError> {
        sqlx::query_as::<_, CourseLevel>(
            r#"INSERT INTO course_levels (course_id, name, description, hours)
               VALUES ($1, $2, $3, $4)
               RETURNING *"#,
        )
        .bind(course_id)
        .bind(dto.name.trim())
        .bind(&dto.description)
        .bind(dto.hours)
        .fetch_one(db)
        .await
        .map_err(|e| {
            // A missing course surfaces as an FK violation on course_id.
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_foreign_key_violation()
            {
                return AppError::not_found(anyhow::anyhow!("Course not found"));
            }
            map_write_error(e, "A level with this name already exists in this course", "Invalid reference")
        })
    }
}
