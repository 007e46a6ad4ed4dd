//! Audit log entity model.

use serde::Serialize;
use sqlx::FromRow;
use trustchain_core::types::Timestamp;

/// A row from the `audit_logs` table, written by the audit persistence
/// service from platform events.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditLog {
    pub id: i64,
    /// Dot-separated event name, e.g. `"checkpoint.flagged"`.
    pub action: String,
    pub actor: Option<String>,
    pub target_id: Option<String>,
    pub payload: serde_json::Value,
    pub created_at: Timestamp,
}
