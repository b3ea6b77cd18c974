//! Course and coach seeding.

use fake::Fake;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::{FirstName, LastName};
use rayon::prelude::*;
use sqlx::PgPool;
use std::time::Instant;
use uuid::Uuid;

use super::models::{CoachSeed, CourseSeed, SEED_PREFIX, seed_key};

const COURSE_NAMES: &[&str] = &[
    "Trabajo seguro en alturas - Trabajador autorizado",
    "Trabajo seguro en alturas - Reentrenamiento",
    "Coordinador de trabajo en alturas",
    "Jefe de área para trabajo en alturas",
    "Rescate en alturas",
    "Andamios y plataformas",
];

pub fn generate_courses(count: usize) -> Vec<CourseSeed> {
    (0..count)
        .into_par_iter()
        .map(|i| CourseSeed {
            code: seed_key(),
            name: COURSE_NAMES[i % COURSE_NAMES.len()].to_string(),
            duration_hours: (8..41).fake(),
            validity_months: [12, 18, 24][i % 3],
        })
        .collect()
}

pub fn generate_coaches(count: usize) -> Vec<CoachSeed> {
    (0..count)
        .into_par_iter()
        .map(|_| CoachSeed {
            first_name: FirstName().fake(),
            last_name: LastName().fake(),
            email: SafeEmail().fake(),
            license_number: seed_key(),
        })
        .collect()
}

pub async fn seed_courses(
    db: &PgPool,
    count: usize,
) -> Result<Vec<Uuid>, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("📚 Seeding {} courses...", count);

    let mut tx = db.begin().await?;
    let mut ids = Vec::with_capacity(count);
    for course in generate_courses(count) {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO courses (code, name, duration_hours, validity_months)
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&course.code)
        .bind(&course.name)
        .bind(course.duration_hours)
        .bind(course.validity_months)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO course_levels (course_id, name, hours)
             VALUES ($1, 'Básico', $2), ($1, 'Avanzado', $3)",
        )
        .bind(id)
        .bind(course.duration_hours / 2)
        .bind(course.duration_hours)
        .execute(&mut *tx)
        .await?;

        ids.push(id);
    }
    tx.commit().await?;

    println!("   ✓ Inserted {} courses in {:?}", ids.len(), start_time.elapsed());
    Ok(ids)
}

pub async fn seed_coaches(
    db: &PgPool,
    count: usize,
) -> Result<Vec<Uuid>, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🧗 Seeding {} coaches...", count);

    let mut tx = db.begin().await?;
    let mut ids = Vec::with_capacity(count);
    for coach in generate_coaches(count) {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO coaches (first_name, last_name, email, license_number)
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&coach.first_name)
        .bind(&coach.last_name)
        .bind(&coach.email)
        .bind(&coach.license_number)
        .fetch_one(&mut *tx)
        .await?;
        ids.push(id);
    }
    tx.commit().await?;

    println!("   ✓ Inserted {} coaches in {:?}", ids.len(), start_time.elapsed());
    Ok(ids)
}

/// Removes seeded courses (levels cascade) and coaches.
pub async fn clear_catalogue(db: &PgPool) -> Result<u64, Box<dyn std::error::Error>> {
    let pattern = format!("{}%", SEED_PREFIX);

    let coaches = sqlx::query("DELETE FROM coaches WHERE license_number LIKE $1")
        .bind(&pattern)
        .execute(db)
        .await?
        .rows_affected();
    let courses = sqlx::query("DELETE FROM courses WHERE code LIKE $1")
        .bind(&pattern)
        .execute(db)
        .await?
        .rows_affected();

    println!("   ✓ Deleted {} courses and {} coaches", courses, coaches);
    Ok(courses + coaches)
}
