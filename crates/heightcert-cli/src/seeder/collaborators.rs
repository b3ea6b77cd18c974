//! Collaborator seeding.

use fake::Fake;
use fake::faker::internet::en::SafeEmail;
use fake::faker::job::en::Title;
use fake::faker::name::en::{FirstName, LastName};
use fake::faker::phone_number::en::PhoneNumber;
use rayon::prelude::*;
use sqlx::{PgPool, Postgres, Transaction};
use std::time::Instant;
use uuid::Uuid;

use super::models::{CollaboratorSeed, SEED_PREFIX, seed_key};

const BATCH_SIZE: usize = 500;

/// Generates collaborator data in parallel using Rayon
pub fn generate_collaborators(count: usize) -> Vec<CollaboratorSeed> {
    (0..count)
        .into_par_iter()
        .map(|_| CollaboratorSeed {
            document_number: seed_key(),
            first_name: FirstName().fake(),
            last_name: LastName().fake(),
            email: SafeEmail().fake(),
            phone: PhoneNumber().fake(),
            position: Title().fake(),
        })
        .collect()
}

pub async fn seed_collaborators(
    db: &PgPool,
    count: usize,
) -> Result<Vec<Uuid>, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("👷 Seeding {} collaborators...", count);

    let collaborators = generate_collaborators(count);
    let mut tx = db.begin().await?;
    let mut ids = Vec::with_capacity(collaborators.len());
    for chunk in collaborators.chunks(BATCH_SIZE) {
        ids.extend(insert_chunk(&mut tx, chunk).await?);
    }
    tx.commit().await?;

    println!(
        "   ✓ Inserted {} collaborators in {:?}",
        ids.len(),
        start_time.elapsed()
    );
    Ok(ids)
}

async fn insert_chunk(
    tx: &mut Transaction<'_, Postgres>,
    rows: &[CollaboratorSeed],
) -> Result<Vec<Uuid>, Box<dyn std::error::Error>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let mut query = String::from(
        "INSERT INTO collaborators (document_number, first_name, last_name, email, phone, position) VALUES ",
    );
    for i in 0..rows.len() {
        if i > 0 {
            query.push_str(", ");
        }
        let p = i * 6;
        query.push_str(&format!(
            "(${}, ${}, ${}, ${}, ${}, ${})",
            p + 1,
            p + 2,
            p + 3,
            p + 4,
            p + 5,
            p + 6
        ));
    }
    query.push_str(" RETURNING id");

    let mut q = sqlx::query_scalar(&query);
    for row in rows {
        q = q
            .bind(&row.document_number)
            .bind(&row.first_name)
            .bind(&row.last_name)
            .bind(&row.email)
            .bind(&row.phone)
            .bind(&row.position);
    }

    Ok(q.fetch_all(&mut **tx).await?)
}

/// Removes seeded collaborators. Run after trainings are cleared, since
/// enrollments reference collaborators.
pub async fn clear_collaborators(db: &PgPool) -> Result<u64, Box<dyn std::error::Error>> {
    let result = sqlx::query("DELETE FROM collaborators WHERE document_number LIKE $1")
        .bind(format!("{}%", SEED_PREFIX))
        .execute(db)
        .await?
        .rows_affected();

    println!("   ✓ Deleted {} collaborators", result);
    Ok(result)
}
