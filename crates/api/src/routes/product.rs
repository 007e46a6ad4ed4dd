//! Route definitions for product registration and retrieval.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::product;
use crate::state::AppState;

/// Routes mounted under `/product`.
///
/// ```text
/// POST /register                 -> register_product
/// GET  /{product_id}             -> get_product
/// GET  /{product_id}/timeline    -> get_product_timeline
/// ```
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(product::register_product))
        .route("/{product_id}", get(product::get_product))
        .route("/{product_id}/timeline", get(product::get_product_timeline))
}
