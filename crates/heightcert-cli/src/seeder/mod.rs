//! Database seeding for local development.
//!
//! Seeded rows are tagged (`SEED-` business keys, `@example.com` emails) so
//! [`clear_all`] removes them without touching real data.
//!
//! - Parallel data generation using Rayon
//! - Batch inserts for collaborators
//! - One bcrypt hash at low cost shared by demo users

pub mod catalogue;
pub mod collaborators;
pub mod models;
pub mod trainings;
pub mod users;

pub use models::SeedConfig;

use sqlx::PgPool;
use std::time::Instant;

pub async fn seed_all(db: &PgPool, config: SeedConfig) -> Result<(), Box<dyn std::error::Error>> {
    let start_time = Instant::now();

    println!("🌱 Starting full database seeding...");
    println!(
        "   - Collaborators: {}, Courses: {}, Coaches: {}",
        config.collaborators, config.courses, config.coaches
    );
    println!(
        "   - Trainings: {}, Enrollments per training: {}",
        config.trainings, config.enrollments_per_training
    );

    users::seed_demo_users(db).await?;
    let collaborator_ids = collaborators::seed_collaborators(db, config.collaborators).await?;
    let course_ids = catalogue::seed_courses(db, config.courses).await?;
    let coach_ids = catalogue::seed_coaches(db, config.coaches).await?;
    let trainings =
        trainings::seed_trainings(db, config.trainings, &course_ids, &coach_ids).await?;
    trainings::seed_enrollments(
        db,
        &trainings,
        &collaborator_ids,
        config.enrollments_per_training,
    )
    .await?;

    println!("\n✅ Seeding complete in {:?}", start_time.elapsed());
    println!(
        "\n📝 Demo logins: coordinator@{0} / viewer@{0}, password: {1}",
        models::SEED_EMAIL_DOMAIN,
        models::DEFAULT_PASSWORD
    );

    Ok(())
}

/// Clears seeded data in dependency order. Admin accounts are kept.
pub async fn clear_all(db: &PgPool) -> Result<(), Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🗑️  Clearing seeded data...");

    trainings::clear_trainings(db).await?;
    collaborators::clear_collaborators(db).await?;
    catalogue::clear_catalogue(db).await?;
    users::clear_demo_users(db).await?;

    println!("\n✅ Cleared seeded data in {:?}", start_time.elapsed());
    Ok(())
}
