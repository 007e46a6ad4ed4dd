pub mod checkpoint;
pub mod dkg;
pub mod health;
pub mod product;
pub mod scan;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /product/register              register a product (POST)
/// /product/{product_id}          product details (GET)
/// /product/{product_id}/timeline full event chain with signals (GET)
///
/// /checkpoint/submit             submit one checkpoint event (POST)
/// /checkpoint/batch              submit several checkpoint events (POST)
///
/// /scan/{product_id}             consumer scan (GET)
/// /scan/{product_id}/trust       trust score breakdown (GET)
///
/// /dkg/{product_id}              ledger sync status (GET)
/// /dkg/{product_id}/asset        ledger view of the asset (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/product", product::product_routes())
        .nest("/checkpoint", checkpoint::checkpoint_routes())
        .nest("/scan", scan::scan_routes())
        .nest("/dkg", dkg::dkg_routes())
}
