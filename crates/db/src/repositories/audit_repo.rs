//! Repository for the `audit_logs` table.

use sqlx::PgPool;

use crate::models::audit::AuditLog;

/// Column list for `audit_logs` queries.
const COLUMNS: &str = "id, action, actor, target_id, payload, created_at";

/// Provides read/write operations for audit log entries.
pub struct AuditRepo;

impl AuditRepo {
    /// Insert a new audit entry, returning the generated ID.
    pub async fn insert(
        pool: &PgPool,
        action: &str,
        actor: Option<&str>,
        target_id: Option<&str>,
        payload: &serde_json::Value,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO audit_logs (action, actor, target_id, payload) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id",
        )
        .bind(action)
        .bind(actor)
        .bind(target_id)
        .bind(payload)
        .fetch_one(pool)
        .await
    }

    /// List recent entries newest-first.
    pub async fn list_recent(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AuditLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM audit_logs ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
