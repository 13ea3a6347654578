//! Category Repository
//!
//! The slug is always derived from the name with [`slugify`]; clients never
//! send one.

use super::{RepoError, RepoResult};
use crate::utils::slugify;
use shared::models::{Category, CategoryCreate, CategoryUpdate, Patch};
use shared::util::now_millis;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

const SELECT_CATEGORY: &str =
    "SELECT id, name, slug, description, image_url, created_at FROM categories";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Category>> {
    let categories =
        sqlx::query_as::<_, Category>(&format!("{SELECT_CATEGORY} ORDER BY name, id"))
            .fetch_all(pool)
            .await?;
    Ok(categories)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Category>> {
    let category = sqlx::query_as::<_, Category>(&format!("{SELECT_CATEGORY} WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(category)
}

pub async fn find_by_slug(pool: &SqlitePool, slug: &str) -> RepoResult<Option<Category>> {
    let category = sqlx::query_as::<_, Category>(&format!("{SELECT_CATEGORY} WHERE slug = ?"))
        .bind(slug)
        .fetch_optional(pool)
        .await?;
    Ok(category)
}

pub async fn exists(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM categories WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

/// Trimmed name and its slug
///
/// A name made only of symbols yields an empty slug; the unique index still
/// allows just one such category.
fn name_and_slug(name: &str) -> RepoResult<(String, String)> {
    let name = name.trim();
    if name.is_empty() {
        return Err(RepoError::Validation("Category name is required".into()));
    }
    Ok((name.to_string(), slugify(name)))
}

/// Empty descriptions are stored as NULL
fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

pub async fn create(pool: &SqlitePool, data: CategoryCreate) -> RepoResult<Category> {
    let (name, slug) = name_and_slug(&data.name)?;

    if find_by_slug(pool, &slug).await?.is_some() {
        return Err(RepoError::Duplicate(format!(
            "A category with slug '{slug}' already exists"
        )));
    }

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO categories (name, slug, description, created_at) \
         VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(&name)
    .bind(&slug)
    .bind(normalize_description(data.description))
    .bind(now_millis())
    .fetch_one(pool)
    .await
    .map_err(|e| match RepoError::from(e) {
        // Lost a race with a concurrent insert of the same slug
        RepoError::Duplicate(_) => {
            RepoError::Duplicate(format!("A category with slug '{slug}' already exists"))
        }
        other => other,
    })?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create category".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: CategoryUpdate) -> RepoResult<Category> {
    let existing = find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Category {id} not found")))?;

    if data.is_empty() {
        return Ok(existing);
    }

    let renamed = match &data.name {
        Patch::Present(name) => {
            let (name, slug) = name_and_slug(name)?;
            if let Some(other) = find_by_slug(pool, &slug).await?
                && other.id != id
            {
                return Err(RepoError::Duplicate(format!(
                    "A category with slug '{slug}' already exists"
                )));
            }
            Some((name, slug))
        }
        Patch::Absent => None,
    };

    let mut qb = QueryBuilder::<Sqlite>::new("UPDATE categories SET ");
    {
        let mut set = qb.separated(", ");
        if let Some((name, slug)) = renamed {
            set.push("name = ").push_bind_unseparated(name);
            set.push("slug = ").push_bind_unseparated(slug);
        }
        if let Patch::Present(description) = data.description {
            set.push("description = ")
                .push_bind_unseparated(normalize_description(description));
        }
    }
    qb.push(" WHERE id = ").push_bind(id);

    let result = qb.build().execute(pool).await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Category {id} not found")));
    }

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Category {id} not found")))
}

/// Delete a category; its products keep existing with `category_id = NULL`
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    let detached: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE category_id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;

    let result = sqlx::query("DELETE FROM categories WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Category {id} not found")));
    }

    if detached > 0 {
        tracing::info!(
            category_id = id,
            products = detached,
            "Category deleted, products left uncategorized"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::CatalogStore;

    fn create_data(name: &str) -> CategoryCreate {
        CategoryCreate {
            name: name.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_create_derives_slug() {
        let store = CatalogStore::open_in_memory().await.unwrap();
        let pool = store.pool();

        let category = create(pool, create_data("Billeteras con Tarjetero")).await.unwrap();
        assert_eq!(category.slug, "billeteras-con-tarjetero");
        assert_eq!(category.name, "Billeteras con Tarjetero");
        assert!(category.created_at > 0);

        let accented = create(pool, create_data("  Cinturones Clásicos ")).await.unwrap();
        assert_eq!(accented.name, "Cinturones Clásicos");
        assert_eq!(accented.slug, "cinturones-clasicos");
    }

    #[tokio::test]
    async fn test_create_rejects_colliding_slug() {
        let store = CatalogStore::open_in_memory().await.unwrap();
        let pool = store.pool();

        create(pool, create_data("Relojes")).await.unwrap();
        let err = create(pool, create_data("RELOJES!")).await.unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_name() {
        let store = CatalogStore::open_in_memory().await.unwrap();
        let pool = store.pool();

        assert!(matches!(
            create(pool, create_data("   ")).await.unwrap_err(),
            RepoError::Validation(_)
        ));
        assert!(find_all(pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_symbol_only_name_gets_empty_slug() {
        let store = CatalogStore::open_in_memory().await.unwrap();
        let pool = store.pool();

        let stars = create(pool, create_data("***")).await.unwrap();
        assert_eq!(stars.name, "***");
        assert_eq!(stars.slug, "");

        // Second empty slug collides on the unique index
        let err = create(pool, create_data("!!!")).await.unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));

        let other = create(pool, create_data("Relojes")).await.unwrap();
        let err = update(
            pool,
            other.id,
            CategoryUpdate {
                name: Patch::Present("???".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));

        assert_eq!(find_all(pool).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_find_all_orders_by_name() {
        let store = CatalogStore::open_in_memory().await.unwrap();
        let pool = store.pool();

        for name in ["Tarjeteros", "Grabados", "Relojes"] {
            create(pool, create_data(name)).await.unwrap();
        }
        let names: Vec<String> = find_all(pool)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Grabados", "Relojes", "Tarjeteros"]);
    }

    #[tokio::test]
    async fn test_update_name_rederives_slug_and_keeps_description() {
        let store = CatalogStore::open_in_memory().await.unwrap();
        let pool = store.pool();

        let category = create(
            pool,
            CategoryCreate {
                name: "Relojes".into(),
                description: Some("Relojes de cuero".into()),
            },
        )
        .await
        .unwrap();

        let updated = update(
            pool,
            category.id,
            CategoryUpdate {
                name: Patch::Present("Relojes Pulsera".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.slug, "relojes-pulsera");
        assert_eq!(updated.description.as_deref(), Some("Relojes de cuero"));
        assert_eq!(updated.created_at, category.created_at);

        assert!(find_by_slug(pool, "relojes").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_description_only_and_clear() {
        let store = CatalogStore::open_in_memory().await.unwrap();
        let pool = store.pool();
        let category = create(pool, create_data("Grabados")).await.unwrap();

        let updated = update(
            pool,
            category.id,
            CategoryUpdate {
                description: Patch::Present(Some("Personalizados".into())),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.slug, "grabados");
        assert_eq!(updated.description.as_deref(), Some("Personalizados"));

        let cleared = update(
            pool,
            category.id,
            CategoryUpdate {
                description: Patch::Present(Some("".into())),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(cleared.description, None);
    }

    #[tokio::test]
    async fn test_update_to_own_slug_is_allowed() {
        let store = CatalogStore::open_in_memory().await.unwrap();
        let pool = store.pool();
        let category = create(pool, create_data("Relojes")).await.unwrap();

        let updated = update(
            pool,
            category.id,
            CategoryUpdate {
                name: Patch::Present("relojes".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.name, "relojes");
        assert_eq!(updated.slug, "relojes");
    }

    #[tokio::test]
    async fn test_update_conflict_and_not_found() {
        let store = CatalogStore::open_in_memory().await.unwrap();
        let pool = store.pool();
        create(pool, create_data("Relojes")).await.unwrap();
        let other = create(pool, create_data("Grabados")).await.unwrap();

        let err = update(
            pool,
            other.id,
            CategoryUpdate {
                name: Patch::Present("Relojes".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));

        let err = update(pool, 999, CategoryUpdate::default()).await.unwrap_err();
        assert!(matches!(err, RepoError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_leaves_products_uncategorized() {
        let store = CatalogStore::open_in_memory().await.unwrap();
        let pool = store.pool();
        let category = create(pool, create_data("Relojes")).await.unwrap();

        sqlx::query(
            "INSERT INTO products (name, price, category_id, created_at, updated_at) \
             VALUES ('Reloj', 1000, ?, 1, 1)",
        )
        .bind(category.id)
        .execute(pool)
        .await
        .unwrap();

        delete(pool, category.id).await.unwrap();

        let remaining: Option<i64> =
            sqlx::query_scalar("SELECT category_id FROM products WHERE name = 'Reloj'")
                .fetch_one(pool)
                .await
                .unwrap();
        assert_eq!(remaining, None);

        assert!(matches!(
            delete(pool, category.id).await.unwrap_err(),
            RepoError::NotFound(_)
        ));
    }
}
