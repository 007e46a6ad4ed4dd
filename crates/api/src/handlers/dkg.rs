//! Handlers for ledger (DKG) sync status and asset queries.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use trustchain_core::error::CoreError;
use trustchain_db::models::ledger::LedgerJob;
use trustchain_db::models::product::Product;
use trustchain_db::repositories::{LedgerQueueRepo, ProductRepo};
use trustchain_pipeline::AssetRef;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Sync status
// ---------------------------------------------------------------------------

/// Ledger synchronization status for a product.
#[derive(Debug, Serialize)]
pub struct LedgerStatus {
    pub product_id: String,
    /// Asset locator, set once the publish job has completed.
    pub ual: Option<String>,
    pub pending_jobs: i64,
    pub jobs: Vec<LedgerJob>,
}

/// GET /api/v1/dkg/{product_id}
///
/// Ledger sync status: the UAL (when published) and the write queue.
pub async fn get_ledger_status(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let product = find_product(&state, &product_id).await?;

    let jobs = LedgerQueueRepo::list_for_product(&state.pool, &product_id).await?;
    let pending_jobs = LedgerQueueRepo::count_pending(&state.pool, &product_id).await?;

    Ok(Json(DataResponse {
        data: LedgerStatus {
            product_id: product.product_id,
            ual: product.dkg_ual,
            pending_jobs,
            jobs,
        },
    }))
}

// ---------------------------------------------------------------------------
// Asset query
// ---------------------------------------------------------------------------

/// GET /api/v1/dkg/{product_id}/asset
///
/// Proxy the ledger's current view of the product's asset. Read-only: a
/// ledger outage here returns 502 without touching local state, and an
/// unpublished product returns 409.
pub async fn query_ledger_asset(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let product = find_product(&state, &product_id).await?;

    let ual = product.dkg_ual.ok_or_else(|| {
        AppError::Conflict(format!(
            "product {} has not been published to the ledger yet",
            product.product_id
        ))
    })?;

    let asset = state
        .ledger
        .query(&AssetRef(ual))
        .await
        .map_err(|e| AppError::LedgerUnavailable(e.to_string()))?;

    Ok(Json(DataResponse { data: asset }))
}

async fn find_product(state: &AppState, product_id: &str) -> Result<Product, AppError> {
    ProductRepo::find_by_id(&state.pool, product_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Product",
            id: product_id.to_string(),
        }))
}
