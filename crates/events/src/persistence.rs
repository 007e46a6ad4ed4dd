//! Durable audit persistence service.
//!
//! [`AuditPersistence`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! broadcast channel and writes every received [`PlatformEvent`] to the
//! `audit_logs` table. It runs as a long-lived background task and shuts
//! down gracefully when the bus sender is dropped.

use tokio::sync::broadcast;
use trustchain_db::repositories::AuditRepo;
use trustchain_db::DbPool;

use crate::bus::PlatformEvent;

/// Background service that persists platform events to the audit log.
pub struct AuditPersistence;

impl AuditPersistence {
    /// Run the persistence loop.
    ///
    /// Subscribes to the event bus via the provided `receiver` and persists
    /// every event it receives. The loop exits when the channel is closed
    /// (i.e. the [`EventBus`](crate::bus::EventBus) is dropped).
    pub async fn run(pool: DbPool, mut receiver: broadcast::Receiver<PlatformEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = Self::persist(&pool, &event).await {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            "Failed to persist audit entry"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "Audit persistence lagged, some events were not persisted"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, audit persistence shutting down");
                    break;
                }
            }
        }
    }

    /// Write a single event to the `audit_logs` table.
    async fn persist(pool: &DbPool, event: &PlatformEvent) -> Result<i64, sqlx::Error> {
        AuditRepo::insert(
            pool,
            &event.event_type,
            event.actor.as_deref(),
            event.subject_id.as_deref(),
            &event.payload,
        )
        .await
    }
}
