//! Category API
//!
//! `GET /{key}` looks a category up by slug; `PUT`/`DELETE /{key}` take its id.

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/categories", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route(
            "/{key}",
            get(handler::get_by_slug)
                .put(handler::update)
                .delete(handler::delete),
        )
}
