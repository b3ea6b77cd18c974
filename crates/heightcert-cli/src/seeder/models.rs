//! Seed rows and seeding configuration.

use chrono::{DateTime, Utc};
use heightcert_core::TrainingStatus;
use uuid::Uuid;

/// Every seeded business key starts with this, so `clear-seed` can find them.
pub const SEED_PREFIX: &str = "SEED-";

/// Seeded dashboard users share this email domain.
pub const SEED_EMAIL_DOMAIN: &str = "example.com";

pub const DEFAULT_PASSWORD: &str = "password123";

pub struct CollaboratorSeed {
    pub document_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub position: String,
}

pub struct CourseSeed {
    pub code: String,
    pub name: String,
    pub duration_hours: i32,
    pub validity_months: i32,
}

pub struct CoachSeed {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub license_number: String,
}

pub struct TrainingSeed {
    pub code: String,
    pub course_id: Uuid,
    pub coach_id: Option<Uuid>,
    pub location: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: TrainingStatus,
}

#[derive(Clone)]
pub struct SeedConfig {
    pub collaborators: usize,
    pub courses: usize,
    pub coaches: usize,
    pub trainings: usize,
    pub enrollments_per_training: usize,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            collaborators: 100,
            courses: 4,
            coaches: 6,
            trainings: 20,
            enrollments_per_training: 12,
        }
    }
}

impl SeedConfig {
    pub fn new(collaborators: usize) -> Self {
        Self {
            collaborators,
            ..Default::default()
        }
    }

    pub fn with_catalogue(mut self, courses: usize, coaches: usize) -> Self {
        self.courses = courses;
        self.coaches = coaches;
        self
    }

    pub fn with_trainings(mut self, trainings: usize) -> Self {
        self.trainings = trainings;
        self
    }

    pub fn with_enrollments(mut self, per_training: usize) -> Self {
        self.enrollments_per_training = per_training;
        self
    }
}

/// Short random suffix for seeded business keys.
pub fn seed_key() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{}{}", SEED_PREFIX, id[..8].to_uppercase())
}
