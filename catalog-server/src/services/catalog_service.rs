//! Catalog Service
//!
//! Products and categories as the API sees them. Row access goes through
//! `db::repository`; this layer couples each product row to its image file
//! and attaches derived prices to every product it returns.
//!
//! Image ordering:
//! - create: validate, store image, insert row (image removed if the insert fails)
//! - update: check row exists, store new image, update row, delete old image
//! - delete: delete row, then delete image
//!
//! Failures to delete a stale image are logged and swallowed; the row outcome
//! is what the caller gets.

use std::collections::HashMap;
use std::sync::Arc;

use shared::models::{
    CartLine, CartQuote, Category, CategoryCreate, CategoryUpdate, ProductCreate, ProductFilter,
    ProductUpdate, ProductView,
};
use sqlx::SqlitePool;

use super::image_store::{ImageStore, ImageUpload};
use crate::db::CatalogStore;
use crate::db::repository::{RepoError, category, product};
use crate::pricing;
use crate::utils::{AppError, AppResult, ErrorCode};

#[derive(Clone)]
pub struct CatalogService {
    store: CatalogStore,
    images: Arc<dyn ImageStore>,
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

fn product_error(err: RepoError) -> AppError {
    match err {
        RepoError::NotFound(msg) => AppError::with_message(ErrorCode::ProductNotFound, msg),
        other => other.into(),
    }
}

fn category_error(err: RepoError) -> AppError {
    match err {
        RepoError::NotFound(msg) => AppError::with_message(ErrorCode::CategoryNotFound, msg),
        RepoError::Duplicate(msg) => AppError::with_message(ErrorCode::CategorySlugExists, msg),
        other => other.into(),
    }
}

fn product_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::ProductNotFound, format!("Product {id} not found"))
        .with_detail("id", id)
}

impl CatalogService {
    pub fn new(store: CatalogStore, images: Arc<dyn ImageStore>) -> Self {
        Self { store, images }
    }

    fn pool(&self) -> &SqlitePool {
        self.store.pool()
    }

    /// Delete an image whose row no longer references it
    async fn release_image(&self, url: &str) {
        match self.images.delete(url).await {
            Ok(true) => {}
            Ok(false) => tracing::warn!(image_url = %url, "Image file already missing"),
            Err(e) => tracing::warn!(image_url = %url, error = %e, "Failed to delete image file"),
        }
    }

    // =========================================================================
    // Categories
    // =========================================================================

    pub async fn list_categories(&self) -> AppResult<Vec<Category>> {
        category::find_all(self.pool()).await.map_err(category_error)
    }

    pub async fn get_category_by_slug(&self, slug: &str) -> AppResult<Category> {
        category::find_by_slug(self.pool(), slug)
            .await
            .map_err(category_error)?
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::CategoryNotFound,
                    format!("Category '{slug}' not found"),
                )
                .with_detail("slug", slug)
            })
    }

    pub async fn create_category(&self, data: CategoryCreate) -> AppResult<Category> {
        let category = category::create(self.pool(), data)
            .await
            .map_err(category_error)?;
        tracing::info!(id = category.id, slug = %category.slug, "Category created");
        Ok(category)
    }

    pub async fn update_category(&self, id: i64, data: CategoryUpdate) -> AppResult<Category> {
        let category = category::update(self.pool(), id, data)
            .await
            .map_err(category_error)?;
        tracing::info!(id, slug = %category.slug, "Category updated");
        Ok(category)
    }

    pub async fn delete_category(&self, id: i64) -> AppResult<()> {
        category::delete(self.pool(), id)
            .await
            .map_err(category_error)?;
        tracing::info!(id, "Category deleted");
        Ok(())
    }

    // =========================================================================
    // Products
    // =========================================================================

    pub async fn list_products(&self, filter: &ProductFilter) -> AppResult<Vec<ProductView>> {
        let rows = product::find_all(self.pool(), filter)
            .await
            .map_err(product_error)?;
        rows.into_iter()
            .map(|row| pricing::product_view(row).map_err(AppError::from))
            .collect()
    }

    pub async fn get_product(&self, id: i64) -> AppResult<ProductView> {
        let row = product::find_by_id(self.pool(), id)
            .await
            .map_err(product_error)?
            .ok_or_else(|| product_not_found(id))?;
        Ok(pricing::product_view(row)?)
    }

    pub async fn create_product(
        &self,
        data: ProductCreate,
        image: Option<ImageUpload>,
    ) -> AppResult<ProductView> {
        // Reject bad input before any file is written
        product::validate_create(self.pool(), &data)
            .await
            .map_err(product_error)?;

        let image_url = match image {
            Some(upload) => Some(self.images.put(upload).await?),
            None => None,
        };

        let id = match product::insert(self.pool(), data, image_url.as_deref()).await {
            Ok(id) => id,
            Err(e) => {
                if let Some(url) = &image_url {
                    self.release_image(url).await;
                }
                return Err(product_error(e));
            }
        };

        tracing::info!(id, image_url = ?image_url, "Product created");
        self.get_product(id).await
    }

    pub async fn update_product(
        &self,
        id: i64,
        data: ProductUpdate,
        image: Option<ImageUpload>,
    ) -> AppResult<ProductView> {
        let existing = product::find_row(self.pool(), id)
            .await
            .map_err(product_error)?
            .ok_or_else(|| product_not_found(id))?;
        product::validate_update(self.pool(), &data)
            .await
            .map_err(product_error)?;

        let new_image_url = match image {
            Some(upload) => Some(self.images.put(upload).await?),
            None => None,
        };

        if let Err(e) = product::update(self.pool(), id, data, new_image_url.as_deref()).await {
            if let Some(url) = &new_image_url {
                self.release_image(url).await;
            }
            return Err(product_error(e));
        }

        if new_image_url.is_some()
            && let Some(old_url) = &existing.image_url
        {
            self.release_image(old_url).await;
        }

        tracing::info!(id, image_replaced = new_image_url.is_some(), "Product updated");
        self.get_product(id).await
    }

    pub async fn delete_product(&self, id: i64) -> AppResult<()> {
        let removed = product::delete(self.pool(), id)
            .await
            .map_err(product_error)?;
        if let Some(url) = &removed.image_url {
            self.release_image(url).await;
        }
        tracing::info!(id, "Product deleted");
        Ok(())
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Price a cart against the active catalog
    pub async fn quote_cart(&self, lines: &[CartLine]) -> AppResult<CartQuote> {
        if let Some(line) = lines
            .iter()
            .find(|line| !(1..=pricing::MAX_QUANTITY).contains(&line.quantity))
        {
            return Err(AppError::invalid_field(
                "quantity",
                format!(
                    "Quantity for product {} must be between 1 and {}, got {}",
                    line.product_id,
                    pricing::MAX_QUANTITY,
                    line.quantity
                ),
            ));
        }

        let ids: Vec<i64> = lines.iter().map(|line| line.product_id).collect();
        let products: HashMap<i64, _> = product::find_many(self.pool(), &ids)
            .await
            .map_err(product_error)?
            .into_iter()
            .filter(|p| p.is_active)
            .map(|p| (p.id, p))
            .collect();

        let priced = lines
            .iter()
            .map(|line| {
                products
                    .get(&line.product_id)
                    .map(|p| (p, line.quantity))
                    .ok_or_else(|| product_not_found(line.product_id))
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(pricing::quote_cart(&priced)?)
    }
}
