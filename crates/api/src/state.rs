use std::sync::Arc;

use trustchain_events::EventBus;
use trustchain_pipeline::{LedgerProvider, SubmissionPipeline};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: trustchain_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Checkpoint submission pipeline (owns per-product locks).
    pub pipeline: Arc<SubmissionPipeline>,
    /// Ledger collaborator, used directly only on read paths; writes go
    /// through the durable queue.
    pub ledger: Arc<dyn LedgerProvider>,
    /// Centralized event bus for publishing platform events.
    pub event_bus: Arc<EventBus>,
}
