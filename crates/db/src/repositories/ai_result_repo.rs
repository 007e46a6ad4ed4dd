//! Repository for the `ai_results` table.

use sqlx::PgPool;
use trustchain_core::types::EventId;

use crate::models::ai_result::AiResult;

/// Column list for `ai_results` queries.
const COLUMNS: &str = "ai_id, product_id, event_id, validation_score, anomaly_score, \
     fraud_score, composite, dominant_factor, degraded, trust_score_delta, timestamp";

/// Provides read operations for signal snapshots. Inserts happen inside
/// the submission transaction.
pub struct AiResultRepo;

impl AiResultRepo {
    /// Find the snapshot attached to an event.
    pub async fn find_by_event(
        pool: &PgPool,
        event_id: EventId,
    ) -> Result<Option<AiResult>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM ai_results WHERE event_id = $1");
        sqlx::query_as::<_, AiResult>(&query)
            .bind(event_id)
            .fetch_optional(pool)
            .await
    }

    /// The most recent snapshot for a product, if any.
    pub async fn latest_for_product(
        pool: &PgPool,
        product_id: &str,
    ) -> Result<Option<AiResult>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM ai_results \
             WHERE product_id = $1 \
             ORDER BY timestamp DESC, ai_id DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, AiResult>(&query)
            .bind(product_id)
            .fetch_optional(pool)
            .await
    }
}
