//! Handlers for product registration and retrieval.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use trustchain_core::error::CoreError;
use trustchain_core::trust::ProductStatus;
use trustchain_db::models::ai_result::AiResult;
use trustchain_db::models::event::CheckpointEvent;
use trustchain_db::models::product::NewProduct;
use trustchain_db::repositories::{EventRepo, ProductRepo};
use trustchain_events::PlatformEvent;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Register
// ---------------------------------------------------------------------------

/// Request body for `POST /product/register`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterProductInput {
    #[validate(length(min = 1, message = "batch_id must not be empty"))]
    pub batch_id: String,
    #[validate(length(min = 1, message = "manufacturer_id must not be empty"))]
    pub manufacturer_id: String,
    #[serde(default)]
    pub product_metadata: Option<serde_json::Value>,
    /// Initial trust score; falls back to the configured default.
    #[validate(range(min = 0.0, max = 1.0, message = "trust_score must be in [0, 1]"))]
    pub trust_score: Option<f64>,
}

/// POST /api/v1/product/register
///
/// Register a new product. The product ID is server-assigned, the ledger
/// publish is enqueued in the same transaction, and a `product.registered`
/// platform event is emitted.
pub async fn register_product(
    State(state): State<AppState>,
    Json(input): Json<RegisterProductInput>,
) -> AppResult<impl IntoResponse> {
    input
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let trust_score = input
        .trust_score
        .unwrap_or(state.config.engine.trust.initial_trust);

    let product = ProductRepo::register(
        &state.pool,
        &NewProduct {
            product_id: format!("prod-{}", Uuid::now_v7()),
            batch_id: input.batch_id,
            manufacturer_id: input.manufacturer_id,
            product_metadata: input
                .product_metadata
                .unwrap_or_else(|| serde_json::Value::Object(Default::default())),
            registration_timestamp: Utc::now(),
            trust_score,
            status: ProductStatus::Valid.as_str().to_string(),
        },
    )
    .await?;

    state.event_bus.publish(
        PlatformEvent::new("product.registered")
            .with_subject("product", product.product_id.clone())
            .with_payload(serde_json::json!({
                "batch_id": product.batch_id,
                "manufacturer_id": product.manufacturer_id,
            })),
    );

    tracing::info!(
        product_id = %product.product_id,
        batch_id = %product.batch_id,
        "Product registered"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: product })))
}

// ---------------------------------------------------------------------------
// Get
// ---------------------------------------------------------------------------

/// GET /api/v1/product/{product_id}
///
/// Get product details by ID.
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let product = ProductRepo::find_by_id(&state.pool, &product_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Product",
            id: product_id,
        }))?;

    Ok(Json(DataResponse { data: product }))
}

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

/// One chain entry: the event plus its signal snapshot, when present.
#[derive(Debug, Serialize)]
pub struct TimelineEntry {
    #[serde(flatten)]
    pub event: CheckpointEvent,
    pub ai_result: Option<AiResult>,
}

/// GET /api/v1/product/{product_id}/timeline
///
/// Full ordered event chain with signal snapshots.
pub async fn get_product_timeline(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    // 404 for unknown products rather than an empty timeline.
    ProductRepo::find_by_id(&state.pool, &product_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Product",
            id: product_id.clone(),
        }))?;

    let chain = EventRepo::list_chain_with_signals(&state.pool, &product_id).await?;
    let timeline: Vec<TimelineEntry> = chain
        .into_iter()
        .map(|(event, ai_result)| TimelineEntry { event, ai_result })
        .collect();

    Ok(Json(DataResponse { data: timeline }))
}
