//! Training and enrollment seeding.
//!
//! Past trainings are seeded as `COMPLETED` with certificates, current ones
//! as `ACTIVE` and future ones as `PLANNED`.

use chrono::{Duration, Utc};
use fake::Fake;
use fake::faker::address::en::CityName;
use heightcert_core::TrainingStatus;
use rayon::prelude::*;
use sqlx::PgPool;
use std::time::Instant;
use uuid::Uuid;

use super::models::{SEED_PREFIX, TrainingSeed, seed_key};

pub fn generate_trainings(
    count: usize,
    course_ids: &[Uuid],
    coach_ids: &[Uuid],
) -> Vec<TrainingSeed> {
    if course_ids.is_empty() {
        return Vec::new();
    }

    let now = Utc::now();
    (0..count)
        .into_par_iter()
        .map(|_| {
            let start_date = now + Duration::days((-180..90).fake::<i64>());
            let end_date = start_date + Duration::days((1..6).fake::<i64>());
            let status = if end_date < now {
                TrainingStatus::Completed
            } else if start_date <= now {
                TrainingStatus::Active
            } else {
                TrainingStatus::Planned
            };
            let coach_id = (!coach_ids.is_empty())
                .then(|| coach_ids[(0..coach_ids.len()).fake::<usize>()]);

            TrainingSeed {
                code: seed_key(),
                course_id: course_ids[(0..course_ids.len()).fake::<usize>()],
                coach_id,
                location: CityName().fake(),
                start_date,
                end_date,
                status,
            }
        })
        .collect()
}

pub async fn seed_trainings(
    db: &PgPool,
    count: usize,
    course_ids: &[Uuid],
    coach_ids: &[Uuid],
) -> Result<Vec<(Uuid, String, TrainingStatus)>, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("📅 Seeding {} trainings...", count);

    let trainings = generate_trainings(count, course_ids, coach_ids);
    let mut tx = db.begin().await?;
    let mut created = Vec::with_capacity(trainings.len());
    for t in &trainings {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO trainings (code, course_id, coach_id, location, start_date, end_date, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
        )
        .bind(&t.code)
        .bind(t.course_id)
        .bind(t.coach_id)
        .bind(&t.location)
        .bind(t.start_date)
        .bind(t.end_date)
        .bind(t.status.as_str())
        .fetch_one(&mut *tx)
        .await?;
        created.push((id, t.code.clone(), t.status));
    }
    tx.commit().await?;

    println!(
        "   ✓ Inserted {} trainings in {:?}",
        created.len(),
        start_time.elapsed()
    );
    Ok(created)
}

/// Enrolls a rotating window of collaborators into each training. Completed
/// trainings get a certificate per enrollment.
pub async fn seed_enrollments(
    db: &PgPool,
    trainings: &[(Uuid, String, TrainingStatus)],
    collaborator_ids: &[Uuid],
    per_training: usize,
) -> Result<usize, Box<dyn std::error::Error>> {
    if collaborator_ids.is_empty() {
        return Ok(0);
    }

    let start_time = Instant::now();
    let per_training = per_training.min(collaborator_ids.len());
    println!("📝 Seeding {} enrollments per training...", per_training);

    let mut tx = db.begin().await?;
    let mut total = 0;
    for (i, (training_id, code, status)) in trainings.iter().enumerate() {
        let certified = *status == TrainingStatus::Completed;
        for j in 0..per_training {
            let collaborator_id = collaborator_ids[(i * per_training + j) % collaborator_ids.len()];
            let certificate_number = certified
                .then(|| format!("CERT-{}-{:06X}", code, (0..0xFF_FFFFu32).fake::<u32>()));

            sqlx::query(
                "INSERT INTO enrollments (training_id, collaborator_id, certificate_issued, certificate_number, issued_at)
                 VALUES ($1, $2, $3, $4, CASE WHEN $3 THEN NOW() END)
                 ON CONFLICT DO NOTHING",
            )
            .bind(training_id)
            .bind(collaborator_id)
            .bind(certified)
            .bind(certificate_number)
            .execute(&mut *tx)
            .await?;
            total += 1;
        }
    }
    tx.commit().await?;

    println!("   ✓ Inserted {} enrollments in {:?}", total, start_time.elapsed());
    Ok(total)
}

/// Removes seeded trainings; their enrollments cascade.
pub async fn clear_trainings(db: &PgPool) -> Result<u64, Box<dyn std::error::Error>> {
    let result = sqlx::query("DELETE FROM trainings WHERE code LIKE $1")
        .bind(format!("{}%", SEED_PREFIX))
        .execute(db)
        .await?
        .rows_affected();

    println!("   ✓ Deleted {} trainings", result);
    Ok(result)
}
