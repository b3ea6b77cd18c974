use sqlx::PgPool;
use tracing::instrument;

use heightcert_core::AppError;

use super::model::{DashboardSummary, MonthlyReport, MonthlyStats, StatusCount};

pub const MIN_REPORT_YEAR: i32 = 2000;
pub const MAX_REPORT_YEAR: i32 = 2100;

#[derive(sqlx::FromRow)]
struct Totals {
    total_collaborators: i64,
    active_collaborators: i64,
    total_courses: i64,
    total_coaches: i64,
    certificates_issued: i64,
    upcoming_trainings: i64,
}

pub struct DashboardService;

impl DashboardService {
    #[instrument(skip(db), fields(db.operation = "SELECT"))]
    pub async fn summary(db: &PgPool) -> Result<DashboardSummary, AppError> {
        let totals = sqlx::query_as::<_, Totals>(
            r#"SELECT
                   (SELECT COUNT(*) FROM collaborators) AS total_collaborators,
                   (SELECT COUNT(*) FROM collaborators WHERE is_active) AS active_collaborators,
                   (SELECT COUNT(*) FROM courses) AS total_courses,
                   (SELECT COUNT(*) FROM coaches) AS total_coaches,
                   (SELECT COUNT(*) FROM enrollments WHERE certificate_issued) AS certificates_issued,
                   (SELECT COUNT(*) FROM trainings
                    WHERE status = 'PLANNED' AND start_date > NOW()) AS upcoming_trainings"#,
        )
        .fetch_one(db)
        .await?;

        let by_status = sqlx::query_as::<_, StatusCount>(
            "SELECT status, COUNT(*) AS count FROM trainings GROUP BY status",
        )
        .fetch_all(db)
        .await?;

        Ok(DashboardSummary {
            total_collaborators: totals.total_collaborators,
            active_collaborators: totals.active_collaborators,
            total_courses: totals.total_courses,
            total_coaches: totals.total_coaches,
            trainings_by_status: StatusCount::complete(by_status),
            certificates_issued: totals.certificates_issued,
            upcoming_trainings: totals.upcoming_trainings,
        })
    }

    /// A training counts as started in the month of its start date unless it
    /// was cancelled, and as completed in the month of its end date (start
    /// date when no end date is set).
    #[instrument(skip(db), fields(db.operation = "SELECT"))]
    pub async fn monthly_report(db: &PgPool, year: i32) -> Result<MonthlyReport, AppError> {
        let rows = sqlx::query_as::<_, MonthlyStats>(
            r#"WITH months AS (
                   SELECT m::int4 AS month,
                          make_timestamptz($1, m, 1, 0, 0, 0, 'UTC') AS month_start
                   FROM generate_series(1, 12) AS m
               )
               SELECT
                   month,
                   (SELECT COUNT(*) FROM trainings t
                    WHERE t.status <> 'CANCELLED'
                      AND t.start_date >= month_start
                      AND t.start_date < month_start + INTERVAL '1 month') AS trainings_started,
                   (SELECT COUNT(*) FROM trainings t
                    WHERE t.status = 'COMPLETED'
                      AND COALESCE(t.end_date, t.start_date) >= month_start
                      AND COALESCE(t.end_date, t.start_date) < month_start + INTERVAL '1 month') AS trainings_completed,
                   (SELECT COUNT(*) FROM enrollments e
                    WHERE e.created_at >= month_start
                      AND e.created_at < month_start + INTERVAL '1 month') AS enrollments,
                   (SELECT COUNT(*) FROM enrollments e
                    WHERE e.certificate_issued
                      AND e.issued_at >= month_start
                      AND e.issued_at < month_start + INTERVAL '1 month') AS certificates_issued
               FROM months
               ORDER BY month"#,
        )
        .bind(year)
        .fetch_all(db)
        .await?;

        Ok(MonthlyReport {
            year,
            months: MonthlyStats::full_year(rows),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heightcert_core::TrainingStatus;

    async fn seed(db: &PgPool) {
        sqlx::query(
            r#"WITH course AS (
                   INSERT INTO courses (code, name, duration_hours, validity_months)
                   VALUES ('TSA', 'Alturas', 40, 12) RETURNING id
               )
               INSERT INTO trainings (code, course_id, start_date, end_date, status)
               SELECT v.code, course.id, v.start_date, v.end_date, v.status
               FROM course, (VALUES
                   ('T-1', TIMESTAMPTZ '2023-03-10 08:00Z', TIMESTAMPTZ '2023-04-02 17:00Z', 'COMPLETED'),
                   ('T-2', TIMESTAMPTZ '2023-03-20 08:00Z', NULL, 'CANCELLED'),
                   ('T-3', TIMESTAMPTZ '2023-07-01 08:00Z', NULL, 'ACTIVE'),
                   ('T-4', NOW() + INTERVAL '30 days', NULL, 'PLANNED')
               ) AS v(code, start_date, end_date, status)"#,
        )
        .execute(db)
        .await
        .unwrap();

        sqlx::query(
            r#"INSERT INTO collaborators (document_number, first_name, last_name, is_active)
               VALUES ('1001', 'Ana', 'Ruiz', TRUE), ('1002', 'Juan', 'Mora', FALSE)"#,
        )
        .execute(db)
        .await
        .unwrap();

        sqlx::query(
            r#"INSERT INTO enrollments (training_id, collaborator_id, certificate_issued, issued_at, created_at)
               SELECT t.id, c.id, TRUE, TIMESTAMPTZ '2023-04-03 10:00Z', TIMESTAMPTZ '2023-03-01 10:00Z'
               FROM trainings t, collaborators c
               WHERE t.code = 'T-1'"#,
        )
        .execute(db)
        .await
        .unwrap();
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_summary(pool: PgPool) {
        seed(&pool).await;
        let summary = DashboardService::summary(&pool).await.unwrap();

        assert_eq!(summary.total_collaborators, 2);
        assert_eq!(summary.active_collaborators, 1);
        assert_eq!(summary.total_courses, 1);
        assert_eq!(summary.total_coaches, 0);
        assert_eq!(summary.certificates_issued, 2);
        assert_eq!(summary.upcoming_trainings, 1);
        assert_eq!(summary.trainings_by_status.len(), 5);
        let completed = summary
            .trainings_by_status
            .iter()
            .find(|c| c.status == TrainingStatus::Completed)
            .unwrap();
        assert_eq!(completed.count, 1);
        let postponed = summary
            .trainings_by_status
            .iter()
            .find(|c| c.status == TrainingStatus::Postponed)
            .unwrap();
        assert_eq!(postponed.count, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_monthly_report(pool: PgPool) {
        seed(&pool).await;
        let report = DashboardService::monthly_report(&pool, 2023).await.unwrap();

        assert_eq!(report.year, 2023);
        assert_eq!(report.months.len(), 12);
        // March: T-1 started, T-2 cancelled so not counted
        assert_eq!(report.months[2].trainings_started, 1);
        assert_eq!(report.months[2].enrollments, 2);
        // April: T-1 completed, certificates issued
        assert_eq!(report.months[3].trainings_completed, 1);
        assert_eq!(report.months[3].certificates_issued, 2);
        assert_eq!(report.months[6].trainings_started, 1);
        assert_eq!(report.months[0], MonthlyStats { month: 1, ..Default::default() });
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_empty_year(pool: PgPool) {
        let report = DashboardService::monthly_report(&pool, 2001).await.unwrap();
        assert!(report.months.iter().all(|m| m.trainings_started == 0));
    }
}
