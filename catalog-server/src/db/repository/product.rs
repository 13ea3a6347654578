//! Product Repository
//!
//! Row access only. Image files are handled by `services::CatalogService`,
//! which passes the stored `image_url` in here.
//!
//! `insert` and `update` take payloads that already passed
//! [`validate_create`] / [`validate_update`]; the service runs those before it
//! writes any image file. The schema's CHECK constraints remain the backstop.

use super::{RepoError, RepoResult, category};
use crate::pricing::MAX_PRICE;
use shared::models::{
    Patch, Product, ProductCreate, ProductFilter, ProductUpdate, ProductWithCategory,
};
use shared::util::now_millis;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

const SELECT_WITH_CATEGORY: &str = "SELECT p.id, p.name, p.description, p.price, \
     p.wholesale_price, p.wholesale_min_quantity, p.stock, p.discount_percent, p.category_id, \
     p.image_url, p.is_active, p.created_at, p.updated_at, c.name AS category_name, \
     c.slug AS category_slug \
     FROM products p LEFT JOIN categories c ON p.category_id = c.id";

// ==================== Validation ====================

fn validate_name(name: &str) -> RepoResult<()> {
    if name.trim().is_empty() {
        return Err(RepoError::Validation("Product name is required".into()));
    }
    Ok(())
}

fn is_valid_price(price: f64) -> bool {
    price.is_finite() && price > 0.0 && price <= MAX_PRICE
}

fn validate_price(price: f64) -> RepoResult<()> {
    if !is_valid_price(price) {
        return Err(RepoError::Validation(format!(
            "Price must be a positive number up to {MAX_PRICE}, got {price}"
        )));
    }
    Ok(())
}

fn validate_wholesale_price(price: Option<f64>) -> RepoResult<()> {
    match price {
        Some(p) if !is_valid_price(p) => Err(RepoError::Validation(format!(
            "Wholesale price must be a positive number up to {MAX_PRICE}, got {p}"
        ))),
        _ => Ok(()),
    }
}

fn validate_wholesale_min_quantity(quantity: i32) -> RepoResult<()> {
    if quantity < 1 {
        return Err(RepoError::Validation(format!(
            "Wholesale minimum quantity must be at least 1, got {quantity}"
        )));
    }
    Ok(())
}

fn validate_stock(stock: i32) -> RepoResult<()> {
    if stock < 0 {
        return Err(RepoError::Validation(format!(
            "Stock cannot be negative, got {stock}"
        )));
    }
    Ok(())
}

fn validate_discount(discount: i32) -> RepoResult<()> {
    if !(0..=100).contains(&discount) {
        return Err(RepoError::Validation(format!(
            "Discount must be between 0 and 100, got {discount}"
        )));
    }
    Ok(())
}

async fn validate_category(pool: &SqlitePool, category_id: Option<i64>) -> RepoResult<()> {
    if let Some(id) = category_id
        && !category::exists(pool, id).await?
    {
        return Err(RepoError::Validation(format!("Category {id} does not exist")));
    }
    Ok(())
}

/// Check every field of a create payload (including the category reference)
pub async fn validate_create(pool: &SqlitePool, data: &ProductCreate) -> RepoResult<()> {
    validate_name(&data.name)?;
    validate_price(data.price)?;
    validate_wholesale_price(data.wholesale_price)?;
    validate_wholesale_min_quantity(data.wholesale_min_quantity)?;
    validate_stock(data.stock)?;
    validate_discount(data.discount_percent)?;
    validate_category(pool, data.category_id).await
}

/// Check the supplied fields of an update payload
pub async fn validate_update(pool: &SqlitePool, data: &ProductUpdate) -> RepoResult<()> {
    if let Patch::Present(name) = &data.name {
        validate_name(name)?;
    }
    if let Patch::Present(price) = data.price {
        validate_price(price)?;
    }
    if let Patch::Present(price) = data.wholesale_price {
        validate_wholesale_price(price)?;
    }
    if let Patch::Present(quantity) = data.wholesale_min_quantity {
        validate_wholesale_min_quantity(quantity)?;
    }
    if let Patch::Present(stock) = data.stock {
        validate_stock(stock)?;
    }
    if let Patch::Present(discount) = data.discount_percent {
        validate_discount(discount)?;
    }
    if let Patch::Present(category_id) = data.category_id {
        validate_category(pool, category_id).await?;
    }
    Ok(())
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

// ==================== Queries ====================

/// Products joined with their category, newest first
pub async fn find_all(
    pool: &SqlitePool,
    filter: &ProductFilter,
) -> RepoResult<Vec<ProductWithCategory>> {
    let mut qb = QueryBuilder::<Sqlite>::new(SELECT_WITH_CATEGORY);
    qb.push(" WHERE 1 = 1");
    if let Some(slug) = &filter.category_slug {
        qb.push(" AND c.slug = ").push_bind(slug.clone());
    }
    if filter.active_only {
        qb.push(" AND p.is_active = 1");
    }
    qb.push(" ORDER BY p.created_at DESC, p.id DESC");

    let products = qb
        .build_query_as::<ProductWithCategory>()
        .fetch_all(pool)
        .await?;
    Ok(products)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<ProductWithCategory>> {
    let product = sqlx::query_as::<_, ProductWithCategory>(&format!(
        "{SELECT_WITH_CATEGORY} WHERE p.id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(product)
}

/// Plain row without the category join
pub async fn find_row(pool: &SqlitePool, id: i64) -> RepoResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        "SELECT id, name, description, price, wholesale_price, wholesale_min_quantity, stock, \
         discount_percent, category_id, image_url, is_active, created_at, updated_at \
         FROM products WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(product)
}

pub async fn find_many(pool: &SqlitePool, ids: &[i64]) -> RepoResult<Vec<Product>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT id, name, description, price, wholesale_price, wholesale_min_quantity, stock, \
         discount_percent, category_id, image_url, is_active, created_at, updated_at \
         FROM products WHERE id IN (",
    );
    {
        let mut list = qb.separated(", ");
        for id in ids {
            list.push_bind(*id);
        }
    }
    qb.push(")");
    let products = qb.build_query_as::<Product>().fetch_all(pool).await?;
    Ok(products)
}

/// Insert a validated product row, returning its id
pub async fn insert(
    pool: &SqlitePool,
    data: ProductCreate,
    image_url: Option<&str>,
) -> RepoResult<i64> {
    let now = now_millis();
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO products (name, description, price, wholesale_price, wholesale_min_quantity, \
         stock, discount_percent, category_id, image_url, is_active, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?) RETURNING id",
    )
    .bind(data.name.trim())
    .bind(normalize_description(data.description))
    .bind(data.price)
    .bind(data.wholesale_price)
    .bind(data.wholesale_min_quantity)
    .bind(data.stock)
    .bind(data.discount_percent)
    .bind(data.category_id)
    .bind(image_url)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// Apply the present fields of `data` (and a new `image_url`, when given)
///
/// `updated_at` always moves forward, even for an empty update or two updates
/// within the same millisecond.
pub async fn update(
    pool: &SqlitePool,
    id: i64,
    data: ProductUpdate,
    image_url: Option<&str>,
) -> RepoResult<()> {
    let mut qb = QueryBuilder::<Sqlite>::new("UPDATE products SET ");
    {
        let mut set = qb.separated(", ");
        if let Patch::Present(name) = data.name {
            set.push("name = ").push_bind_unseparated(name.trim().to_string());
        }
        if let Patch::Present(description) = data.description {
            set.push("description = ")
                .push_bind_unseparated(normalize_description(description));
        }
        if let Patch::Present(price) = data.price {
            set.push("price = ").push_bind_unseparated(price);
        }
        if let Patch::Present(wholesale_price) = data.wholesale_price {
            set.push("wholesale_price = ").push_bind_unseparated(wholesale_price);
        }
        if let Patch::Present(quantity) = data.wholesale_min_quantity {
            set.push("wholesale_min_quantity = ").push_bind_unseparated(quantity);
        }
        if let Patch::Present(stock) = data.stock {
            set.push("stock = ").push_bind_unseparated(stock);
        }
        if let Patch::Present(discount) = data.discount_percent {
            set.push("discount_percent = ").push_bind_unseparated(discount);
        }
        if let Patch::Present(category_id) = data.category_id {
            set.push("category_id = ").push_bind_unseparated(category_id);
        }
        if let Patch::Present(is_active) = data.is_active {
            set.push("is_active = ").push_bind_unseparated(is_active);
        }
        if let Some(url) = image_url {
            set.push("image_url = ").push_bind_unseparated(url.to_string());
        }
        set.push("updated_at = MAX(updated_at + 1, ")
            .push_bind_unseparated(now_millis())
            .push_unseparated(")");
    }
    qb.push(" WHERE id = ").push_bind(id);

    let result = qb.build().execute(pool).await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Product {id} not found")));
    }
    Ok(())
}

/// Delete the row, returning it so the caller can release its image
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<Product> {
    let product = find_row(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))?;

    let result = sqlx::query("DELETE FROM products WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Product {id} not found")));
    }
    Ok(product)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::CatalogStore;
    use shared::models::CategoryCreate;

    async fn seeded_category(pool: &SqlitePool, name: &str) -> i64 {
        category::create(
            pool,
            CategoryCreate {
                name: name.to_string(),
                description: None,
            },
        )
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn test_insert_applies_defaults() {
        let store = CatalogStore::open_in_memory().await.unwrap();
        let pool = store.pool();

        let id = insert(pool, ProductCreate::new("Billetera Clásica", 45000.0), None)
            .await
            .unwrap();
        let row = find_by_id(pool, id).await.unwrap().unwrap();

        assert_eq!(row.product.name, "Billetera Clásica");
        assert_eq!(row.product.wholesale_min_quantity, 1);
        assert_eq!(row.product.stock, 0);
        assert_eq!(row.product.discount_percent, 0);
        assert!(row.product.is_active);
        assert_eq!(row.product.image_url, None);
        assert_eq!(row.category_name, None);
        assert_eq!(row.product.created_at, row.product.updated_at);
    }

    #[tokio::test]
    async fn test_validate_create_rejects_invalid_fields() {
        let store = CatalogStore::open_in_memory().await.unwrap();
        let pool = store.pool();

        let cases = [
            ProductCreate::new("", 100.0),
            ProductCreate::new("Cero", 0.0),
            ProductCreate::new("Negativo", -5.0),
            ProductCreate::new("NaN", f64::NAN),
            ProductCreate::new("Lujo", 1e30),
            ProductCreate::new("Justo encima", MAX_PRICE * 1.5),
            ProductCreate {
                discount_percent: 101,
                ..ProductCreate::new("Descuento", 100.0)
            },
            ProductCreate {
                stock: -1,
                ..ProductCreate::new("Stock", 100.0)
            },
            ProductCreate {
                wholesale_min_quantity: 0,
                ..ProductCreate::new("Mayorista", 100.0)
            },
            ProductCreate {
                wholesale_price: Some(0.0),
                ..ProductCreate::new("Mayorista", 100.0)
            },
            ProductCreate {
                wholesale_price: Some(1e20),
                ..ProductCreate::new("Mayorista", 100.0)
            },
            ProductCreate {
                category_id: Some(42),
                ..ProductCreate::new("Huérfano", 100.0)
            },
        ];

        for data in cases {
            let err = validate_create(pool, &data).await.unwrap_err();
            assert!(matches!(err, RepoError::Validation(_)), "{err:?}");
        }

        assert!(validate_create(pool, &ProductCreate::new("Tope", MAX_PRICE)).await.is_ok());
    }

    #[tokio::test]
    async fn test_schema_rejects_out_of_range_rows() {
        let store = CatalogStore::open_in_memory().await.unwrap();
        let pool = store.pool();

        for data in [
            ProductCreate::new("Cero", 0.0),
            ProductCreate::new("Lujo", 1e30),
            ProductCreate {
                discount_percent: 101,
                ..ProductCreate::new("Descuento", 100.0)
            },
        ] {
            let err = insert(pool, data, None).await.unwrap_err();
            assert!(matches!(err, RepoError::Validation(_)), "{err:?}");
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_partial_update_touches_only_present_fields() {
        let store = CatalogStore::open_in_memory().await.unwrap();
        let pool = store.pool();

        let data = ProductCreate {
            description: Some("Cuero legítimo".into()),
            stock: 2,
            ..ProductCreate::new("Tarjetero", 30000.0)
        };
        let id = insert(pool, data, Some("/uploads/a.png")).await.unwrap();
        let before = find_row(pool, id).await.unwrap().unwrap();

        update(
            pool,
            id,
            ProductUpdate {
                stock: Patch::Present(5),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();

        let after = find_row(pool, id).await.unwrap().unwrap();
        assert_eq!(after.stock, 5);
        assert_eq!(after.name, before.name);
        assert_eq!(after.price, before.price);
        assert_eq!(after.description, before.description);
        assert_eq!(after.image_url, before.image_url);
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at > before.updated_at);
    }

    #[tokio::test]
    async fn test_update_clears_nullable_fields() {
        let store = CatalogStore::open_in_memory().await.unwrap();
        let pool = store.pool();
        let category_id = seeded_category(pool, "Relojes").await;

        let data = ProductCreate {
            description: Some("Con correa".into()),
            wholesale_price: Some(80.0),
            category_id: Some(category_id),
            ..ProductCreate::new("Reloj", 100.0)
        };
        let id = insert(pool, data, None).await.unwrap();

        update(
            pool,
            id,
            ProductUpdate {
                description: Patch::Present(None),
                wholesale_price: Patch::Present(None),
                category_id: Patch::Present(None),
                is_active: Patch::Present(false),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();

        let row = find_by_id(pool, id).await.unwrap().unwrap();
        assert_eq!(row.product.description, None);
        assert_eq!(row.product.wholesale_price, None);
        assert_eq!(row.product.category_id, None);
        assert_eq!(row.category_slug, None);
        assert!(!row.product.is_active);
    }

    #[tokio::test]
    async fn test_update_unknown_and_invalid() {
        let store = CatalogStore::open_in_memory().await.unwrap();
        let pool = store.pool();

        let err = update(pool, 7, ProductUpdate::default(), None).await.unwrap_err();
        assert!(matches!(err, RepoError::NotFound(_)));

        let id = insert(pool, ProductCreate::new("Reloj", 100.0), None).await.unwrap();
        for price in [-1.0, MAX_PRICE * 2.0] {
            let data = ProductUpdate {
                price: Patch::Present(price),
                ..Default::default()
            };
            let err = validate_update(pool, &data).await.unwrap_err();
            assert!(matches!(err, RepoError::Validation(_)));
        }
        assert_eq!(find_row(pool, id).await.unwrap().unwrap().price, 100.0);
    }

    #[tokio::test]
    async fn test_find_all_filters_and_orders() {
        let store = CatalogStore::open_in_memory().await.unwrap();
        let pool = store.pool();
        let relojes = seeded_category(pool, "Relojes").await;
        let grabados = seeded_category(pool, "Grabados").await;

        let first = insert(
            pool,
            ProductCreate {
                category_id: Some(relojes),
                ..ProductCreate::new("Reloj A", 100.0)
            },
            None,
        )
        .await
        .unwrap();
        let hidden = insert(
            pool,
            ProductCreate {
                category_id: Some(relojes),
                ..ProductCreate::new("Reloj B", 100.0)
            },
            None,
        )
        .await
        .unwrap();
        let engraved = insert(
            pool,
            ProductCreate {
                category_id: Some(grabados),
                ..ProductCreate::new("Grabado", 100.0)
            },
            None,
        )
        .await
        .unwrap();
        update(
            pool,
            hidden,
            ProductUpdate {
                is_active: Patch::Present(false),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();

        let all: Vec<i64> = find_all(pool, &ProductFilter::default())
            .await
            .unwrap()
            .iter()
            .map(|p| p.product.id)
            .collect();
        assert_eq!(all, vec![engraved, hidden, first]);

        let active = find_all(
            pool,
            &ProductFilter {
                category_slug: None,
                active_only: true,
            },
        )
        .await
        .unwrap();
        assert!(active.iter().all(|p| p.product.is_active));
        assert_eq!(active.len(), 2);

        let watches = find_all(
            pool,
            &ProductFilter {
                category_slug: Some("relojes".into()),
                active_only: false,
            },
        )
        .await
        .unwrap();
        assert_eq!(watches.len(), 2);
        assert!(watches.iter().all(|p| p.category_slug.as_deref() == Some("relojes")));
        assert!(watches.iter().all(|p| p.category_name.as_deref() == Some("Relojes")));

        let none = find_all(
            pool,
            &ProductFilter {
                category_slug: Some("no-existe".into()),
                active_only: false,
            },
        )
        .await
        .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_delete_returns_removed_row() {
        let store = CatalogStore::open_in_memory().await.unwrap();
        let pool = store.pool();

        let id = insert(pool, ProductCreate::new("Reloj", 100.0), Some("/uploads/r.webp"))
            .await
            .unwrap();
        let removed = delete(pool, id).await.unwrap();
        assert_eq!(removed.image_url.as_deref(), Some("/uploads/r.webp"));
        assert!(find_row(pool, id).await.unwrap().is_none());

        assert!(matches!(delete(pool, id).await.unwrap_err(), RepoError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_find_many() {
        let store = CatalogStore::open_in_memory().await.unwrap();
        let pool = store.pool();

        let a = insert(pool, ProductCreate::new("A", 1.0), None).await.unwrap();
        let b = insert(pool, ProductCreate::new("B", 2.0), None).await.unwrap();

        let mut found: Vec<i64> = find_many(pool, &[b, a, 99])
            .await
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        found.sort();
        assert_eq!(found, vec![a, b]);
        assert!(find_many(pool, &[]).await.unwrap().is_empty());
    }
}
