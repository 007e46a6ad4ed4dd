//! Ledger sync queue entity model.

use serde::Serialize;
use sqlx::FromRow;
use trustchain_core::types::{EventId, Timestamp};

/// Queue operation: publish a product asset or append an event to one.
pub const OP_PUBLISH: &str = "publish";
pub const OP_APPEND: &str = "append";

/// A row from the `ledger_queue` table.
///
/// Ledger writes are best-effort and asynchronous: the request path only
/// enqueues, and the sync worker drains with exponential backoff. A row is
/// finished when `completed_at` is set.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LedgerJob {
    pub id: i64,
    pub product_id: String,
    pub event_id: Option<EventId>,
    pub operation: String,
    pub payload: serde_json::Value,
    pub attempts: i32,
    pub next_attempt_at: Timestamp,
    pub last_error: Option<String>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
}
