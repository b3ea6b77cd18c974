//! Training lifecycle statuses and the guard applied before a status change.
//!
//! Only two transitions are business-blocked:
//!
//! - moving to [`TrainingStatus::Cancelled`] once any enrollment has an issued
//!   certificate;
//! - moving to [`TrainingStatus::Completed`] while the start date is still in
//!   the future.
//!
//! Everything else is allowed, including regressive moves such as
//! `COMPLETED -> ACTIVE` and re-applying the current status. The guard never
//! reads the clock itself; callers pass `now`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrainingStatus {
    #[default]
    Planned,
    Active,
    Completed,
    Cancelled,
    Postponed,
}

impl TrainingStatus {
    pub const ALL: [TrainingStatus; 5] = [
        TrainingStatus::Planned,
        TrainingStatus::Active,
        TrainingStatus::Completed,
        TrainingStatus::Cancelled,
        TrainingStatus::Postponed,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            TrainingStatus::Planned => "PLANNED",
            TrainingStatus::Active => "ACTIVE",
            TrainingStatus::Completed => "COMPLETED",
            TrainingStatus::Cancelled => "CANCELLED",
            TrainingStatus::Postponed => "POSTPONED",
        }
    }
}

impl fmt::Display for TrainingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown training status: {0}")]
pub struct UnknownTrainingStatus(pub String);

impl FromStr for TrainingStatus {
    type Err = UnknownTrainingStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PLANNED" => Ok(TrainingStatus::Planned),
            "ACTIVE" => Ok(TrainingStatus::Active),
            "COMPLETED" => Ok(TrainingStatus::Completed),
            "CANCELLED" => Ok(TrainingStatus::Cancelled),
            "POSTPONED" => Ok(TrainingStatus::Postponed),
            other => Err(UnknownTrainingStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for TrainingStatus {
    type Error = UnknownTrainingStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Snapshot of a training as seen by the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionState {
    pub status: TrainingStatus,
    pub start_date: DateTime<Utc>,
    /// True iff at least one enrollment of the training has a certificate.
    pub has_issued_certificates: bool,
}

/// Reason a requested transition was refused. The `Display` text is returned
/// to API clients unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionRejected {
    #[error("cannot cancel: certificates already issued")]
    CertificatesIssued,
    #[error("cannot complete before start date")]
    NotStarted,
}

/// Decides whether `state` may move to `requested`.
///
/// Pure: the same inputs always produce the same answer.
pub fn validate_transition(
    state: &TransitionState,
    requested: TrainingStatus,
    now: DateTime<Utc>,
) -> Result<(), TransitionRejected> {
    match requested {
        TrainingStatus::Cancelled if state.has_issued_certificates => {
            Err(TransitionRejected::CertificatesIssued)
        }
        TrainingStatus::Completed if state.start_date > now => Err(TransitionRejected::NotStarted),
        _ => Ok(()),
    }
}
