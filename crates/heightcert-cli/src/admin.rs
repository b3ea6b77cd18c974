use heightcert_core::{Role, hash_password};
use sqlx::PgPool;

/// Inserts an `ADMIN` user. Fails if the email is already taken.
pub async fn create_admin(
    db: &PgPool,
    first_name: &str,
    last_name: &str,
    email: &str,
    password: &str,
) -> Result<uuid::Uuid, Box<dyn std::error::Error>> {
    let hashed_password =
        hash_password(password).map_err(|e| format!("Failed to hash password: {}", e.error))?;

    let user_id = sqlx::query_scalar::<_, uuid::Uuid>(
        "INSERT INTO users (first_name, last_name, email, password, role)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (email) DO NOTHING
         RETURNING id",
    )
    .bind(first_name)
    .bind(last_name)
    .bind(email)
    .bind(&hashed_password)
    .bind(Role::Admin.as_str())
    .fetch_optional(db)
    .await?;

    user_id.ok_or_else(|| "User with this email already exists".into())
}
