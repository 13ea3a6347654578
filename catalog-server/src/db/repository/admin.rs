//! Admin Repository

use super::RepoResult;
use shared::models::Admin;
use sqlx::SqlitePool;

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> RepoResult<Option<Admin>> {
    let admin = sqlx::query_as::<_, Admin>(
        "SELECT id, email, password, created_at FROM admins WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(admin)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Admin>> {
    let admin = sqlx::query_as::<_, Admin>(
        "SELECT id, email, password, created_at FROM admins WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(admin)
}
