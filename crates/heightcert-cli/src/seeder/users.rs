//! Demo dashboard accounts, one per non-admin role.

use bcrypt::hash;
use heightcert_core::Role;
use sqlx::PgPool;

use super::models::{DEFAULT_PASSWORD, SEED_EMAIL_DOMAIN};

/// Low cost keeps seeding fast; these accounts are for local use only.
pub fn hash_default_password() -> Result<String, Box<dyn std::error::Error>> {
    Ok(hash(DEFAULT_PASSWORD, 4)?)
}

pub async fn seed_demo_users(db: &PgPool) -> Result<u64, Box<dyn std::error::Error>> {
    let password_hash = hash_default_password()?;
    let mut created = 0;

    for role in [Role::Coordinator, Role::Viewer] {
        let name = role.as_str().to_lowercase();
        created += sqlx::query(
            "INSERT INTO users (first_name, last_name, email, password, role)
             VALUES ($1, 'Demo', $2, $3, $4)
             ON CONFLICT (email) DO NOTHING",
        )
        .bind(&name)
        .bind(format!("{}@{}", name, SEED_EMAIL_DOMAIN))
        .bind(&password_hash)
        .bind(role.as_str())
        .execute(db)
        .await?
        .rows_affected();
    }

    println!("👤 Created {} demo users", created);
    Ok(created)
}

pub async fn clear_demo_users(db: &PgPool) -> Result<u64, Box<dyn std::error::Error>> {
    let result = sqlx::query("DELETE FROM users WHERE email LIKE $1 AND role <> $2")
        .bind(format!("%@{}", SEED_EMAIL_DOMAIN))
        .bind(Role::Admin.as_str())
        .execute(db)
        .await?
        .rows_affected();

    println!("   ✓ Deleted {} demo users", result);
    Ok(result)
}
