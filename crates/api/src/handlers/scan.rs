//! Handlers for consumer scans and trust breakdowns.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{Duration, Utc};
use serde::Serialize;

use trustchain_core::error::CoreError;
use trustchain_core::types::{EventId, Timestamp};
use trustchain_db::models::ai_result::AiResult;
use trustchain_db::models::product::Product;
use trustchain_db::repositories::{AiResultRepo, EventRepo, ProductRepo};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Flags included in a trust breakdown.
const RECENT_FLAG_LIMIT: i64 = 5;

// ---------------------------------------------------------------------------
// Scan
// ---------------------------------------------------------------------------

/// Consumer-facing scan result: the product plus its latest signal
/// snapshot.
#[derive(Debug, Serialize)]
pub struct ScanResponse {
    #[serde(flatten)]
    pub product: Product,
    pub latest_signals: Option<AiResult>,
}

/// GET /api/v1/scan/{product_id}
///
/// Fetch product and latest signal snapshot for a consumer scan.
pub async fn scan_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let product = find_product(&state, &product_id).await?;
    let latest_signals = AiResultRepo::latest_for_product(&state.pool, &product_id).await?;

    Ok(Json(DataResponse {
        data: ScanResponse {
            product,
            latest_signals,
        },
    }))
}

// ---------------------------------------------------------------------------
// Trust breakdown
// ---------------------------------------------------------------------------

/// One recent flag in the breakdown.
#[derive(Debug, Serialize)]
pub struct FlagSummary {
    pub event_id: EventId,
    pub timestamp: Timestamp,
    pub event_type: String,
    pub reason: Option<String>,
}

/// Explainable trust breakdown for a product.
#[derive(Debug, Serialize)]
pub struct TrustBreakdown {
    pub product_id: String,
    pub trust_score: f64,
    pub status: String,
    /// Latest raw signals and composite, when any event has been scored.
    pub latest_signals: Option<AiResult>,
    /// Most recent flags, newest first.
    pub recent_flags: Vec<FlagSummary>,
    /// Flags within the rolling escalation window.
    pub flags_in_window: i64,
}

/// GET /api/v1/scan/{product_id}/trust
///
/// Trust score with its per-signal breakdown, dominant factor, and recent
/// flag history.
pub async fn scan_product_trust(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let product = find_product(&state, &product_id).await?;

    let latest_signals = AiResultRepo::latest_for_product(&state.pool, &product_id).await?;

    let recent_flags: Vec<FlagSummary> =
        EventRepo::list_recent_flags(&state.pool, &product_id, RECENT_FLAG_LIMIT)
            .await?
            .into_iter()
            .map(|e| FlagSummary {
                event_id: e.event_id,
                timestamp: e.timestamp,
                event_type: e.event_type,
                reason: e.flag_reason,
            })
            .collect();

    let window = state.config.engine.resolver.flag_window_days;
    let cutoff = Utc::now() - Duration::days(window);
    let flags_in_window = EventRepo::count_flagged_since(&state.pool, &product_id, cutoff).await?;

    Ok(Json(DataResponse {
        data: TrustBreakdown {
            product_id: product.product_id,
            trust_score: product.trust_score,
            status: product.status,
            latest_signals,
            recent_flags,
            flags_in_window,
        },
    }))
}

async fn find_product(state: &AppState, product_id: &str) -> Result<Product, AppError> {
    ProductRepo::find_by_id(&state.pool, product_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Product",
            id: product_id.to_string(),
        }))
}
