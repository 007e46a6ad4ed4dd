//! Signal snapshot entity model.

use serde::Serialize;
use sqlx::FromRow;
use trustchain_core::types::{EventId, Timestamp};
use uuid::Uuid;

/// A row from the `ai_results` table: one immutable signal snapshot per
/// evaluated event.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AiResult {
    pub ai_id: Uuid,
    pub product_id: String,
    pub event_id: Option<EventId>,
    pub validation_score: f64,
    pub anomaly_score: f64,
    pub fraud_score: f64,
    /// Weighted supportive composite derived from the three raw scores.
    pub composite: f64,
    pub dominant_factor: String,
    /// True when neutral fallbacks were substituted because the scoring
    /// collaborator was unavailable.
    pub degraded: bool,
    /// Bounded signed change the submission applied to the trust score.
    pub trust_score_delta: f64,
    pub timestamp: Timestamp,
}

/// Insert payload for a new signal snapshot.
#[derive(Debug, Clone)]
pub struct NewAiResult {
    pub ai_id: Uuid,
    pub product_id: String,
    pub event_id: Option<EventId>,
    pub validation_score: f64,
    pub anomaly_score: f64,
    pub fraud_score: f64,
    pub composite: f64,
    pub dominant_factor: String,
    pub degraded: bool,
    pub trust_score_delta: f64,
    pub timestamp: Timestamp,
}
