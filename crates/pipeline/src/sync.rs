//! Background ledger synchronization.
//!
//! [`LedgerSyncService`] drains the durable `ledger_queue`: publish jobs
//! mint the product's asset on the DKG and store the returned UAL; append
//! jobs mirror checkpoint events onto the existing asset. Failures back off
//! exponentially and never affect local state — the trust engine has
//! already committed by the time a job exists.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use trustchain_db::models::ledger::{LedgerJob, OP_APPEND, OP_PUBLISH};
use trustchain_db::repositories::{LedgerQueueRepo, ProductRepo};
use trustchain_db::DbPool;

use crate::ledger::{AssetRef, LedgerProvider};

/// How often the queue is polled for due jobs.
const POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Jobs claimed per drain pass.
const BATCH_SIZE: i64 = 20;

/// Drains the ledger write queue against a [`LedgerProvider`].
pub struct LedgerSyncService {
    pool: DbPool,
    provider: Arc<dyn LedgerProvider>,
}

impl LedgerSyncService {
    pub fn new(pool: DbPool, provider: Arc<dyn LedgerProvider>) -> Self {
        Self { pool, provider }
    }

    /// Run the sync loop until cancelled.
    pub async fn run(self, cancel: CancellationToken) {
        tracing::info!("Ledger sync service started");
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    tracing::info!("Ledger sync service shutting down");
                    break;
                }
                () = tokio::time::sleep(POLL_INTERVAL) => {}
            }

            match self.drain_due().await {
                Ok(0) => {}
                Ok(n) => tracing::debug!(processed = n, "Ledger sync pass complete"),
                Err(e) => tracing::error!(error = %e, "Ledger sync pass failed"),
            }
        }
    }

    /// Process every currently-due job once. Exposed separately so tests
    /// and one-shot invocations can drive the queue without the timer.
    pub async fn drain_due(&self) -> Result<usize, sqlx::Error> {
        let now = Utc::now();
        let jobs = LedgerQueueRepo::claim_due(&self.pool, now, BATCH_SIZE).await?;
        let count = jobs.len();

        for job in jobs {
            match self.process(&job).await {
                Ok(()) => {
                    LedgerQueueRepo::mark_completed(&self.pool, job.id, Utc::now()).await?;
                    tracing::info!(
                        job_id = job.id,
                        product_id = %job.product_id,
                        operation = %job.operation,
                        "Ledger job completed"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        job_id = job.id,
                        product_id = %job.product_id,
                        attempts = job.attempts,
                        error = %e,
                        "Ledger job failed, scheduling retry"
                    );
                    LedgerQueueRepo::mark_failed(&self.pool, job.id, job.attempts, &e, Utc::now())
                        .await?;
                }
            }
        }

        Ok(count)
    }

    /// Execute a single job against the provider.
    ///
    /// Returns a human-readable error string for the retry record; sqlx
    /// failures while reading product state propagate as errors of the
    /// drain pass itself.
    async fn process(&self, job: &LedgerJob) -> Result<(), String> {
        match job.operation.as_str() {
            OP_PUBLISH => {
                let asset = self
                    .provider
                    .publish(&job.payload)
                    .await
                    .map_err(|e| e.to_string())?;
                ProductRepo::set_dkg_ual(&self.pool, &job.product_id, asset.as_str())
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(())
            }
            OP_APPEND => {
                let product = ProductRepo::find_by_id(&self.pool, &job.product_id)
                    .await
                    .map_err(|e| e.to_string())?
                    .ok_or_else(|| format!("product {} not found", job.product_id))?;

                // Publish jobs are enqueued at registration and processed
                // oldest-first, so a missing UAL just means the publish has
                // not landed yet: retry later.
                let ual = product
                    .dkg_ual
                    .ok_or_else(|| "asset not yet published, deferring append".to_string())?;

                self.provider
                    .append(&AssetRef(ual), &job.payload)
                    .await
                    .map_err(|e| e.to_string())
            }
            other => Err(format!("unknown ledger operation '{other}'")),
        }
    }
}
