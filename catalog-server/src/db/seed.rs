//! Default rows inserted on first start
//!
//! Idempotent: categories are keyed by their unique slug and the admin by its
//! unique email (`INSERT OR IGNORE`), so re-running never duplicates or
//! overwrites anything.

use crate::auth::password;
use crate::utils::slugify;
use shared::util::now_millis;
use sqlx::SqlitePool;

/// Default shop categories: (name, image_url)
pub const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    (
        "Billeteras con Tarjetero",
        "https://images.unsplash.com/photo-1627123424574-724758594e93?w=400",
    ),
    (
        "Tarjeteros",
        "https://images.unsplash.com/photo-1590874103328-eac38a683ce7?w=400",
    ),
    (
        "Relojes",
        "https://images.unsplash.com/photo-1524592094714-0f0654e20314?w=400",
    ),
    (
        "Grabados",
        "https://images.unsplash.com/photo-1603189343302-e603f7add05a?w=400",
    ),
];

/// Credentials of the admin created on first start
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

pub async fn seed_defaults(pool: &SqlitePool, admin: &AdminSeed) -> Result<(), sqlx::Error> {
    let now = now_millis();

    let mut inserted = 0u64;
    for (name, image_url) in DEFAULT_CATEGORIES {
        inserted += sqlx::query(
            "INSERT OR IGNORE INTO categories (name, slug, image_url, created_at) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(name)
        .bind(slugify(name))
        .bind(image_url)
        .bind(now)
        .execute(pool)
        .await?
        .rows_affected();
    }

    let admin_exists: Option<i64> = sqlx::query_scalar("SELECT id FROM admins WHERE email = ?")
        .bind(&admin.email)
        .fetch_optional(pool)
        .await?;

    if admin_exists.is_none() {
        let hash = password::hash_password(&admin.password)
            .map_err(|e| sqlx::Error::Protocol(format!("Failed to hash admin password: {e}")))?;
        sqlx::query("INSERT OR IGNORE INTO admins (email, password, created_at) VALUES (?, ?, ?)")
            .bind(&admin.email)
            .bind(hash)
            .bind(now)
            .execute(pool)
            .await?;
        tracing::info!(email = %admin.email, "Default admin created");
    }

    if inserted > 0 {
        tracing::info!(count = inserted, "Default categories seeded");
    }

    Ok(())
}
