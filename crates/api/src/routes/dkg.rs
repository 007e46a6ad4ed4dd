//! Route definitions for ledger (DKG) status and asset queries.

use axum::routing::get;
use axum::Router;

use crate::handlers::dkg;
use crate::state::AppState;

/// Routes mounted under `/dkg`.
///
/// ```text
/// GET /{product_id}       -> get_ledger_status
/// GET /{product_id}/asset -> query_ledger_asset
/// ```
pub fn dkg_routes() -> Router<AppState> {
    Router::new()
        .route("/{product_id}", get(dkg::get_ledger_status))
        .route("/{product_id}/asset", get(dkg::query_ledger_asset))
}
