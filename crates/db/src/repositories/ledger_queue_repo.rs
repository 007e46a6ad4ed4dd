//! Repository for the `ledger_queue` table.

use sqlx::PgPool;
use trustchain_core::types::{EventId, Timestamp};

use crate::models::ledger::LedgerJob;

/// Column list for `ledger_queue` queries.
const COLUMNS: &str = "id, product_id, event_id, operation, payload, attempts, \
     next_attempt_at, last_error, completed_at, created_at";

/// Base delay before the first retry, in seconds. Doubles per attempt,
/// capped at one hour.
const RETRY_BASE_SECS: i64 = 30;
const RETRY_CAP_SECS: i64 = 3_600;

/// Provides queue operations for best-effort ledger synchronization.
pub struct LedgerQueueRepo;

impl LedgerQueueRepo {
    /// Enqueue a ledger write, returning the job ID.
    pub async fn enqueue(
        pool: &PgPool,
        product_id: &str,
        event_id: Option<EventId>,
        operation: &str,
        payload: &serde_json::Value,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO ledger_queue (product_id, event_id, operation, payload) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id",
        )
        .bind(product_id)
        .bind(event_id)
        .bind(operation)
        .bind(payload)
        .fetch_one(pool)
        .await
    }

    /// Claim jobs due for processing, oldest first.
    pub async fn claim_due(
        pool: &PgPool,
        now: Timestamp,
        limit: i64,
    ) -> Result<Vec<LedgerJob>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM ledger_queue \
             WHERE completed_at IS NULL AND next_attempt_at <= $1 \
             ORDER BY created_at \
             LIMIT $2"
        );
        sqlx::query_as::<_, LedgerJob>(&query)
            .bind(now)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Mark a job as completed.
    pub async fn mark_completed(pool: &PgPool, id: i64, now: Timestamp) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE ledger_queue SET completed_at = $2 WHERE id = $1")
            .bind(id)
            .bind(now)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Record a failed attempt and schedule the retry with exponential
    /// backoff (30s base, doubling per attempt, capped at an hour).
    pub async fn mark_failed(
        pool: &PgPool,
        id: i64,
        attempts_so_far: i32,
        error: &str,
        now: Timestamp,
    ) -> Result<(), sqlx::Error> {
        let delay_secs =
            (RETRY_BASE_SECS << attempts_so_far.min(20) as i64).min(RETRY_CAP_SECS);
        let next_attempt = now + chrono::Duration::seconds(delay_secs);

        sqlx::query(
            "UPDATE ledger_queue \
             SET attempts = attempts + 1, last_error = $2, next_attempt_at = $3 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(error)
        .bind(next_attempt)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// List a product's queue entries, newest first.
    pub async fn list_for_product(
        pool: &PgPool,
        product_id: &str,
    ) -> Result<Vec<LedgerJob>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM ledger_queue \
             WHERE product_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, LedgerJob>(&query)
            .bind(product_id)
            .fetch_all(pool)
            .await
    }

    /// Count pending (incomplete) entries for a product.
    pub async fn count_pending(pool: &PgPool, product_id: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM ledger_queue \
             WHERE product_id = $1 AND completed_at IS NULL",
        )
        .bind(product_id)
        .fetch_one(pool)
        .await
    }
}
