//! Checkpoint event entity model.

use serde::Serialize;
use sqlx::FromRow;
use trustchain_core::types::{EventId, Timestamp};

/// A row from the `events` table.
///
/// Rows are append-only: once persisted an event is immutable, and
/// corrections arrive as new events. `trust_score_after` stores the trust
/// score produced by this submission so that a duplicate retry of the same
/// `event_id` can replay the original response.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CheckpointEvent {
    pub event_id: EventId,
    pub product_id: String,
    pub timestamp: Timestamp,
    pub event_type: String,
    /// `{ "lat": .., "lng": .. }` when the scan carried a position.
    pub location: Option<serde_json::Value>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub handler_id: Option<String>,
    pub flagged: bool,
    pub flag_reason: Option<String>,
    pub trust_score_after: f64,
    pub created_at: Timestamp,
}

/// Insert payload for a new checkpoint event.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub event_id: EventId,
    pub product_id: String,
    pub timestamp: Timestamp,
    pub event_type: String,
    pub location: Option<serde_json::Value>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub handler_id: Option<String>,
    pub flagged: bool,
    pub flag_reason: Option<String>,
    pub trust_score_after: f64,
}
