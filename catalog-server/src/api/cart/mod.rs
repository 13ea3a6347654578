//! Cart API
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /api/cart/quote | POST | none |

use axum::{Json, Router, extract::State, routing::post};
use shared::models::{CartLine, CartQuote};

use crate::core::ServerState;
use crate::utils::AppResult;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/cart/quote", post(quote))
}

/// POST /api/cart/quote - body is `[{product_id, quantity}, ...]`
async fn quote(
    State(state): State<ServerState>,
    Json(items): Json<Vec<CartLine>>,
) -> AppResult<Json<CartQuote>> {
    let quote = state.catalog.quote_cart(&items).await?;
    Ok(Json(quote))
}
