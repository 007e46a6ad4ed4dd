//! Atomic submission commit.
//!
//! A checkpoint submission mutates three things: the append-only event
//! chain, the signal snapshot log, and the product's cached trust score.
//! They must commit together or not at all — a cancelled or failed request
//! must never leave a partially-applied state, and a client retrying with
//! the same `event_id` must hit the events primary key instead of
//! double-applying the score.

use sqlx::PgPool;
use trustchain_core::types::EventId;

use crate::models::ai_result::NewAiResult;
use crate::models::event::NewEvent;

/// Everything a submission persists in one transaction.
#[derive(Debug, Clone)]
pub struct SubmissionRecord {
    pub event: NewEvent,
    pub snapshot: NewAiResult,
    pub trust_score: f64,
    pub status: String,
    /// Payload for the queued ledger append (best-effort mirror).
    pub ledger_payload: serde_json::Value,
}

/// Commits a full submission as a single transaction.
pub struct SubmissionRepo;

impl SubmissionRepo {
    /// Persist the event, its signal snapshot, the ledger queue entry, and
    /// the product's updated trust score atomically.
    ///
    /// Returns the event ID. A duplicate `event_id` aborts the whole
    /// transaction with a unique violation on the events primary key.
    pub async fn commit(pool: &PgPool, record: &SubmissionRecord) -> Result<EventId, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let event = &record.event;
        sqlx::query(
            "INSERT INTO events \
                (event_id, product_id, timestamp, event_type, location, temperature, \
                 humidity, handler_id, flagged, flag_reason, trust_score_after) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(event.event_id)
        .bind(&event.product_id)
        .bind(event.timestamp)
        .bind(&event.event_type)
        .bind(&event.location)
        .bind(event.temperature)
        .bind(event.humidity)
        .bind(&event.handler_id)
        .bind(event.flagged)
        .bind(&event.flag_reason)
        .bind(event.trust_score_after)
        .execute(&mut *tx)
        .await?;

        let snapshot = &record.snapshot;
        sqlx::query(
            "INSERT INTO ai_results \
                (ai_id, product_id, event_id, validation_score, anomaly_score, \
                 fraud_score, composite, dominant_factor, degraded, \
                 trust_score_delta, timestamp) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(snapshot.ai_id)
        .bind(&snapshot.product_id)
        .bind(snapshot.event_id)
        .bind(snapshot.validation_score)
        .bind(snapshot.anomaly_score)
        .bind(snapshot.fraud_score)
        .bind(snapshot.composite)
        .bind(&snapshot.dominant_factor)
        .bind(snapshot.degraded)
        .bind(snapshot.trust_score_delta)
        .bind(snapshot.timestamp)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO ledger_queue (product_id, event_id, operation, payload) \
             VALUES ($1, $2, 'append', $3)",
        )
        .bind(&event.product_id)
        .bind(event.event_id)
        .bind(&record.ledger_payload)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE products \
             SET trust_score = $2, status = $3, updated_at = now() \
             WHERE product_id = $1",
        )
        .bind(&event.product_id)
        .bind(record.trust_score)
        .bind(&record.status)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(event.event_id)
    }
}
