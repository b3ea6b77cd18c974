//! Read-only aggregates for the dashboard and the monthly report.

use heightcert_core::TrainingStatus;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
pub struct StatusCount {
    #[sqlx(try_from = "String")]
    pub status: TrainingStatus,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardSummary {
    pub total_collaborators: i64,
    pub active_collaborators: i64,
    pub total_courses: i64,
    pub total_coaches: i64,
    /// One entry per status, zero counts included
    pub trainings_by_status: Vec<StatusCount>,
    pub certificates_issued: i64,
    /// Planned trainings whose start date is still ahead
    pub upcoming_trainings: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, FromRow, ToSchema)]
pub struct MonthlyStats {
    /// 1-12
    pub month: i32,
    pub trainings_started: i64,
    pub trainings_completed: i64,
    pub enrollments: i64,
    pub certificates_issued: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MonthlyReport {
    pub year: i32,
    /// Always twelve entries, January first
    pub months: Vec<MonthlyStats>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    /// Defaults to the current year
    pub year: Option<i32>,
}

impl StatusCount {
    /// Fills in zero counts so every status appears once, in declaration order.
    pub fn complete(counts: Vec<StatusCount>) -> Vec<StatusCount> {
        TrainingStatus::ALL
            .iter()
            .map(|status| StatusCount {
                status: *status,
                count: counts
                    .iter()
                    .find(|c| c.status == *status)
                    .map_or(0, |c| c.count),
            })
            .collect()
    }
}

impl MonthlyStats {
    /// Spreads sparse rows over January..December.
    pub fn full_year(rows: Vec<MonthlyStats>) -> Vec<MonthlyStats> {
        (1..=12)
            .map(|month| {
                rows.iter()
                    .find(|r| r.month == month)
                    .cloned()
                    .unwrap_or(MonthlyStats {
                        month,
                        ..Default::default()
                    })
            })
            .collect()
    }
}
