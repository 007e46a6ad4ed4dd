//! Handlers for checkpoint event submission.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use trustchain_core::trust::ProductStatus;
use trustchain_core::types::EventId;
use trustchain_pipeline::{NewCheckpoint, SubmissionOutcome, SubmitError};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response shape
// ---------------------------------------------------------------------------

/// Wire shape of a submission result.
#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub event_id: EventId,
    pub accepted: bool,
    pub flagged: bool,
    pub degraded: bool,
    pub duplicate: bool,
    pub new_trust_score: f64,
    pub status: ProductStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub ledger_sync_pending: bool,
}

impl From<SubmissionOutcome> for SubmissionResponse {
    fn from(outcome: SubmissionOutcome) -> Self {
        Self {
            event_id: outcome.event_id,
            accepted: outcome.accepted,
            flagged: outcome.flagged,
            degraded: outcome.degraded,
            duplicate: outcome.duplicate,
            new_trust_score: outcome.trust_score,
            status: outcome.status,
            reason: outcome.reason,
            ledger_sync_pending: outcome.ledger_pending,
        }
    }
}

// ---------------------------------------------------------------------------
// Single submission
// ---------------------------------------------------------------------------

/// POST /api/v1/checkpoint/submit
///
/// Submit a single checkpoint event through the trust pipeline. Hard chain
/// rejections surface as 422 with the reason; flagged events return 201
/// with `flagged: true` (accepted-with-warning).
pub async fn submit_checkpoint(
    State(state): State<AppState>,
    Json(input): Json<NewCheckpoint>,
) -> AppResult<impl IntoResponse> {
    let outcome = state.pipeline.submit(input).await.map_err(AppError::from)?;

    tracing::info!(
        event_id = %outcome.event_id,
        flagged = outcome.flagged,
        degraded = outcome.degraded,
        duplicate = outcome.duplicate,
        trust_score = outcome.trust_score,
        "Checkpoint submitted"
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: SubmissionResponse::from(outcome),
        }),
    ))
}

// ---------------------------------------------------------------------------
// Batch submission
// ---------------------------------------------------------------------------

/// Request body for `POST /checkpoint/batch`.
#[derive(Debug, Deserialize)]
pub struct BatchInput {
    pub events: Vec<NewCheckpoint>,
}

/// Per-event result within a batch: either the submission outcome or the
/// error that stopped this event (a rejection never aborts the rest of the
/// batch).
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum BatchEntry {
    Ok(SubmissionResponse),
    Err {
        accepted: bool,
        code: &'static str,
        reason: String,
    },
}

/// POST /api/v1/checkpoint/batch
///
/// Submit several checkpoint events sequentially. Events may target
/// different products; ordering within the batch is preserved per product
/// by the pipeline's per-product locks.
pub async fn submit_checkpoint_batch(
    State(state): State<AppState>,
    Json(input): Json<BatchInput>,
) -> AppResult<impl IntoResponse> {
    let mut results = Vec::with_capacity(input.events.len());

    for event in input.events {
        match state.pipeline.submit(event).await {
            Ok(outcome) => results.push(BatchEntry::Ok(SubmissionResponse::from(outcome))),
            Err(SubmitError::Core(core)) => results.push(BatchEntry::Err {
                accepted: false,
                code: match &core {
                    trustchain_core::error::CoreError::ChainRejected(_) => "CHAIN_REJECTED",
                    trustchain_core::error::CoreError::NotFound { .. } => "NOT_FOUND",
                    _ => "VALIDATION_ERROR",
                },
                reason: core.to_string(),
            }),
            // Storage failures abort the whole batch: the caller cannot
            // tell which side of the failure later events would land on.
            Err(SubmitError::Persistence(db)) => return Err(AppError::Database(db)),
        }
    }

    Ok((StatusCode::CREATED, Json(DataResponse { data: results })))
}
