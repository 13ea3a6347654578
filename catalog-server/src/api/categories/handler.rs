//! Category API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{Category, CategoryCreate, CategoryUpdate};

use crate::api::parse_id;
use crate::auth::CurrentAdmin;
use crate::core::ServerState;
use crate::utils::{ApiResponse, AppResult};

/// GET /api/categories
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Category>>> {
    let categories = state.catalog.list_categories().await?;
    Ok(Json(categories))
}

/// GET /api/categories/{slug}
pub async fn get_by_slug(
    State(state): State<ServerState>,
    Path(slug): Path<String>,
) -> AppResult<Json<Category>> {
    let category = state.catalog.get_category_by_slug(&slug).await?;
    Ok(Json(category))
}

/// POST /api/categories
pub async fn create(
    State(state): State<ServerState>,
    admin: CurrentAdmin,
    Json(payload): Json<CategoryCreate>,
) -> AppResult<(http::StatusCode, Json<Category>)> {
    let category = state.catalog.create_category(payload).await?;
    tracing::debug!(admin_id = admin.id, id = category.id, "Category created via API");
    Ok((http::StatusCode::CREATED, Json(category)))
}

/// PUT /api/categories/{id}
pub async fn update(
    State(state): State<ServerState>,
    admin: CurrentAdmin,
    Path(id): Path<String>,
    Json(payload): Json<CategoryUpdate>,
) -> AppResult<Json<Category>> {
    let id = parse_id(&id)?;
    let category = state.catalog.update_category(id, payload).await?;
    tracing::debug!(admin_id = admin.id, id, "Category updated via API");
    Ok(Json(category))
}

/// DELETE /api/categories/{id}
pub async fn delete(
    State(state): State<ServerState>,
    admin: CurrentAdmin,
    Path(id): Path<String>,
) -> AppResult<ApiResponse> {
    let id = parse_id(&id)?;
    state.catalog.delete_category(id).await?;
    tracing::debug!(admin_id = admin.id, id, "Category deleted via API");
    Ok(ApiResponse::ok())
}
