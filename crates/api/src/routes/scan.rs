//! Route definitions for consumer scans.

use axum::routing::get;
use axum::Router;

use crate::handlers::scan;
use crate::state::AppState;

/// Routes mounted under `/scan`.
///
/// ```text
/// GET /{product_id}       -> scan_product
/// GET /{product_id}/trust -> scan_product_trust
/// ```
pub fn scan_routes() -> Router<AppState> {
    Router::new()
        .route("/{product_id}", get(scan::scan_product))
        .route("/{product_id}/trust", get(scan::scan_product_trust))
}
