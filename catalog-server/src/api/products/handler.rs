//! Product API Handlers

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
};
use serde::Deserialize;
use shared::models::{ProductFilter, ProductView};

use super::form::ProductForm;
use crate::api::parse_id;
use crate::auth::CurrentAdmin;
use crate::core::ServerState;
use crate::utils::{ApiResponse, AppResult};

/// Listing query: `?category=<slug>&active_only=true`
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    pub active_only: Option<String>,
}

impl From<ListQuery> for ProductFilter {
    fn from(query: ListQuery) -> Self {
        Self {
            category_slug: query.category.filter(|slug| !slug.is_empty()),
            active_only: query.active_only.as_deref() == Some("true"),
        }
    }
}

/// GET /api/products
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<ProductView>>> {
    let products = state.catalog.list_products(&query.into()).await?;
    Ok(Json(products))
}

/// GET /api/products/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ProductView>> {
    let product = state.catalog.get_product(parse_id(&id)?).await?;
    Ok(Json(product))
}

/// POST /api/products (multipart)
pub async fn create(
    State(state): State<ServerState>,
    admin: CurrentAdmin,
    multipart: Multipart,
) -> AppResult<(http::StatusCode, Json<ProductView>)> {
    let (data, image) = ProductForm::from_multipart(multipart).await?.into_create()?;
    let product = state.catalog.create_product(data, image).await?;
    tracing::debug!(admin_id = admin.id, id = product.item.product.id, "Product created via API");
    Ok((http::StatusCode::CREATED, Json(product)))
}

/// PUT /api/products/{id} (multipart, partial)
pub async fn update(
    State(state): State<ServerState>,
    admin: CurrentAdmin,
    Path(id): Path<String>,
    multipart: Multipart,
) -> AppResult<Json<ProductView>> {
    let id = parse_id(&id)?;
    let (data, image) = ProductForm::from_multipart(multipart).await?.into_update()?;
    let product = state.catalog.update_product(id, data, image).await?;
    tracing::debug!(admin_id = admin.id, id, "Product updated via API");
    Ok(Json(product))
}

/// DELETE /api/products/{id}
pub async fn delete(
    State(state): State<ServerState>,
    admin: CurrentAdmin,
    Path(id): Path<String>,
) -> AppResult<ApiResponse> {
    let id = parse_id(&id)?;
    state.catalog.delete_product(id).await?;
    tracing::debug!(admin_id = admin.id, id, "Product deleted via API");
    Ok(ApiResponse::ok())
}
