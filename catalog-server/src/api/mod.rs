//! API routes
//!
//! - [`health`] - liveness and store check
//! - [`auth`] - admin login and token verification
//! - [`categories`] - category CRUD
//! - [`products`] - product CRUD with image upload
//! - [`cart`] - cart price quotes
//!
//! Reads are public. Every mutation handler takes a
//! [`CurrentAdmin`](crate::auth::CurrentAdmin) argument.

pub mod auth;
pub mod cart;
pub mod categories;
pub mod health;
pub mod products;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use http::{HeaderValue, Method, header};
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;
use crate::services::image_store::MAX_IMAGE_SIZE;
use crate::utils::{AppError, AppResult};

/// Request body cap: one image plus the text fields around it
pub const MAX_REQUEST_BODY: usize = MAX_IMAGE_SIZE + 1024 * 1024;

/// API routes without state or layers
pub fn routes() -> Router<ServerState> {
    Router::<ServerState>::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(categories::router())
        .merge(products::router())
        .merge(cart::router())
}

/// Full application: API routes, `/uploads` static files and HTTP layers
pub fn build_app(state: ServerState) -> Router {
    let uploads = ServeDir::new(&state.config.uploads_dir);
    let cors = cors_layer(&state.config.cors_origins);

    routes()
        .with_state(state)
        .nest_service("/uploads", uploads)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Numeric id from a path segment
pub(crate) fn parse_id(raw: &str) -> AppResult<i64> {
    raw.parse()
        .map_err(|_| AppError::invalid_field("id", format!("Invalid id: {raw}")))
}
