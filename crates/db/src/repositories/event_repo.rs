//! Repository for the `events` table.

use sqlx::PgPool;
use trustchain_core::types::{EventId, Timestamp};

use crate::models::ai_result::AiResult;
use crate::models::event::CheckpointEvent;

/// Column list for `events` queries.
const COLUMNS: &str = "event_id, product_id, timestamp, event_type, location, temperature, \
     humidity, handler_id, flagged, flag_reason, trust_score_after, created_at";

/// Provides read operations for checkpoint events. Writes go through
/// [`SubmissionRepo`](crate::repositories::SubmissionRepo) so they commit
/// atomically with the score update.
pub struct EventRepo;

impl EventRepo {
    /// Find an event by its ID (duplicate detection on retries).
    pub async fn find_by_id(
        pool: &PgPool,
        event_id: EventId,
    ) -> Result<Option<CheckpointEvent>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM events WHERE event_id = $1");
        sqlx::query_as::<_, CheckpointEvent>(&query)
            .bind(event_id)
            .fetch_optional(pool)
            .await
    }

    /// Load a product's full chain in total order: timestamp, then
    /// event_id as a deterministic tie-break.
    pub async fn list_chain(
        pool: &PgPool,
        product_id: &str,
    ) -> Result<Vec<CheckpointEvent>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM events \
             WHERE product_id = $1 \
             ORDER BY timestamp, event_id"
        );
        sqlx::query_as::<_, CheckpointEvent>(&query)
            .bind(product_id)
            .fetch_all(pool)
            .await
    }

    /// Load the chain joined with its signal snapshots, same total order.
    pub async fn list_chain_with_signals(
        pool: &PgPool,
        product_id: &str,
    ) -> Result<Vec<(CheckpointEvent, Option<AiResult>)>, sqlx::Error> {
        // Two queries instead of a row-tuple join keep the FromRow
        // mappings straightforward; the chain is small per product.
        let events = Self::list_chain(pool, product_id).await?;

        let snapshots: Vec<AiResult> = sqlx::query_as(
            "SELECT ai_id, product_id, event_id, validation_score, anomaly_score, \
                    fraud_score, composite, dominant_factor, degraded, \
                    trust_score_delta, timestamp \
             FROM ai_results WHERE product_id = $1",
        )
        .bind(product_id)
        .fetch_all(pool)
        .await?;

        let mut by_event: std::collections::HashMap<EventId, AiResult> = snapshots
            .into_iter()
            .filter_map(|s| s.event_id.map(|id| (id, s)))
            .collect();

        Ok(events
            .into_iter()
            .map(|e| {
                let snapshot = by_event.remove(&e.event_id);
                (e, snapshot)
            })
            .collect())
    }

    /// Count flagged events newer than `cutoff` (rolling flag window).
    pub async fn count_flagged_since(
        pool: &PgPool,
        product_id: &str,
        cutoff: Timestamp,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM events \
             WHERE product_id = $1 AND flagged = TRUE AND timestamp > $2",
        )
        .bind(product_id)
        .bind(cutoff)
        .fetch_one(pool)
        .await
    }

    /// List a product's most recent flagged events, newest first.
    pub async fn list_recent_flags(
        pool: &PgPool,
        product_id: &str,
        limit: i64,
    ) -> Result<Vec<CheckpointEvent>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM events \
             WHERE product_id = $1 AND flagged = TRUE \
             ORDER BY timestamp DESC, event_id DESC \
             LIMIT $2"
        );
        sqlx::query_as::<_, CheckpointEvent>(&query)
            .bind(product_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
