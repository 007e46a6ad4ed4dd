//! The checkpoint submission pipeline.
//!
//! One submission runs: shape validation → per-product lock → duplicate
//! check → chain validation → signal scoring → conflict resolution → trust
//! recomputation → atomic persistence → platform events. The only
//! suspension points are storage round-trips and the scoring call; all
//! engine logic is synchronous computation over already-fetched data.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use trustchain_core::chain::{self, ChainLink, EventType};
use trustchain_core::config::EngineConfig;
use trustchain_core::error::CoreError;
use trustchain_core::resolver;
use trustchain_core::signal::{self, RawSignals};
use trustchain_core::trust::{self, ProductStatus, ScoredEvent};
use trustchain_core::types::{EventId, Timestamp};
use trustchain_db::models::ai_result::NewAiResult;
use trustchain_db::models::event::{CheckpointEvent, NewEvent};
use trustchain_db::models::product::Product;
use trustchain_db::repositories::{EventRepo, ProductRepo, SubmissionRecord, SubmissionRepo};
use trustchain_db::DbPool;
use trustchain_events::{EventBus, PlatformEvent};

use crate::locks::ProductLocks;
use crate::scoring::{ScoringProvider, ScoringRequest};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Geographic position of a checkpoint scan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    fn validate(&self) -> Result<(), CoreError> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(CoreError::Validation(format!(
                "latitude must be between -90 and 90, got {}",
                self.lat
            )));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(CoreError::Validation(format!(
                "longitude must be between -180 and 180, got {}",
                self.lng
            )));
        }
        Ok(())
    }
}

/// Signal scores embedded in the submission by an edge device that already
/// ran the model locally.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EmbeddedSignals {
    pub validation_score: f64,
    pub anomaly_score: f64,
    pub fraud_score: f64,
}

impl From<EmbeddedSignals> for RawSignals {
    fn from(s: EmbeddedSignals) -> Self {
        RawSignals {
            validation: s.validation_score,
            anomaly: s.anomaly_score,
            fraud: s.fraud_score,
        }
    }
}

/// A checkpoint event as submitted by a handler.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCheckpoint {
    /// Client-supplied for idempotent retry; generated when absent.
    pub event_id: Option<EventId>,
    pub product_id: String,
    /// Event time; server-assigned when absent.
    pub timestamp: Option<Timestamp>,
    pub event_type: String,
    pub location: Option<Location>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub handler_id: Option<String>,
    /// Pre-computed signal snapshot; when absent the scoring collaborator
    /// is consulted.
    pub ai_results: Option<EmbeddedSignals>,
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Result of a persisted (or replayed) submission.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionOutcome {
    pub event_id: EventId,
    /// Always true for persisted outcomes; rejections surface as errors.
    pub accepted: bool,
    pub flagged: bool,
    /// True when neutral scores were substituted for an unavailable
    /// scoring collaborator.
    pub degraded: bool,
    /// True when this `event_id` was already committed and the stored
    /// result is being replayed.
    pub duplicate: bool,
    pub trust_score: f64,
    pub status: ProductStatus,
    pub reason: Option<String>,
    /// True while the ledger mirror write is still queued.
    pub ledger_pending: bool,
}

/// Submission failure.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Storage failure: nothing was applied, the client may retry with the
    /// same event_id.
    #[error("persistence failure: {0}")]
    Persistence(#[from] sqlx::Error),
}

// ---------------------------------------------------------------------------
// SubmissionPipeline
// ---------------------------------------------------------------------------

/// Orchestrates checkpoint submissions end to end.
pub struct SubmissionPipeline {
    pool: DbPool,
    config: EngineConfig,
    scoring: Arc<dyn ScoringProvider>,
    bus: Arc<EventBus>,
    locks: ProductLocks,
}

impl SubmissionPipeline {
    pub fn new(
        pool: DbPool,
        config: EngineConfig,
        scoring: Arc<dyn ScoringProvider>,
        bus: Arc<EventBus>,
    ) -> Self {
        Self {
            pool,
            config,
            scoring,
            bus,
            locks: ProductLocks::new(),
        }
    }

    /// Submit one checkpoint event.
    ///
    /// Holds the product's lock from the history read through the commit so
    /// concurrent submissions for the same product serialize; submissions
    /// for different products proceed independently.
    pub async fn submit(&self, input: NewCheckpoint) -> Result<SubmissionOutcome, SubmitError> {
        // Shape validation happens before any storage read.
        let event_type = EventType::parse(&input.event_type)?;
        if let Some(location) = &input.location {
            location.validate()?;
        }
        if let Some(embedded) = &input.ai_results {
            RawSignals::from(*embedded).validate()?;
        }

        let event_id = input.event_id.unwrap_or_else(Uuid::new_v4);
        let _guard = self.locks.acquire(&input.product_id).await;

        let product = ProductRepo::find_by_id(&self.pool, &input.product_id)
            .await?
            .ok_or_else(|| CoreError::NotFound {
                entity: "Product",
                id: input.product_id.clone(),
            })?;

        // Retry after a timeout that masked a successful commit: replay
        // the stored result instead of double-applying.
        if let Some(existing) = EventRepo::find_by_id(&self.pool, event_id).await? {
            return Ok(Self::replay(&product, existing));
        }

        let chain_rows = EventRepo::list_chain_with_signals(&self.pool, &input.product_id).await?;
        let links: Vec<ChainLink> = chain_rows
            .iter()
            .filter_map(|(e, _)| {
                EventType::parse(&e.event_type).ok().map(|event_type| ChainLink {
                    event_type,
                    timestamp: e.timestamp,
                })
            })
            .collect();

        let effective_ts = input.timestamp.unwrap_or_else(Utc::now);
        let decision = chain::validate_event(
            product.registration_timestamp,
            &links,
            event_type,
            effective_ts,
            Duration::seconds(self.config.skew_tolerance_secs),
        );

        let (raw, degraded) = self.resolve_signals(&product, &input, event_type).await;
        let aggregated = signal::aggregate(&raw, &self.config.weights, degraded)?;

        let history: Vec<ScoredEvent> = chain_rows
            .iter()
            .map(|(e, s)| ScoredEvent {
                event_id: e.event_id,
                timestamp: e.timestamp,
                composite: s.as_ref().map(|snap| snap.composite),
                flagged: e.flagged,
            })
            .collect();

        let prior_flags =
            resolver::count_recent_flags(&history, effective_ts, &self.config.resolver);
        let resolution = resolver::resolve(&decision, &aggregated, prior_flags, &self.config.resolver);

        if !resolution.accept_event {
            let reason = resolution
                .reason
                .unwrap_or_else(|| "chain validation rejected the event".to_string());
            return Err(CoreError::ChainRejected(reason).into());
        }

        let mut full_history = history;
        full_history.push(ScoredEvent {
            event_id,
            timestamp: effective_ts,
            composite: Some(aggregated.composite),
            flagged: resolution.flagged,
        });
        let trust_score = trust::recompute(
            &full_history,
            self.config.resolver.signal_floor,
            &self.config.trust,
        );
        let status = resolution
            .status_override
            .unwrap_or_else(|| trust::derive_status(trust_score, &self.config.trust));
        let delta = (trust_score - product.trust_score).clamp(-1.0, 1.0);

        let record = SubmissionRecord {
            event: NewEvent {
                event_id,
                product_id: input.product_id.clone(),
                timestamp: effective_ts,
                event_type: event_type.as_str().to_string(),
                location: input
                    .location
                    .map(|l| serde_json::json!({ "lat": l.lat, "lng": l.lng })),
                temperature: input.temperature,
                humidity: input.humidity,
                handler_id: input.handler_id.clone(),
                flagged: resolution.flagged,
                flag_reason: resolution.reason.clone(),
                trust_score_after: trust_score,
            },
            snapshot: NewAiResult {
                ai_id: Uuid::new_v4(),
                product_id: input.product_id.clone(),
                event_id: Some(event_id),
                validation_score: raw.validation,
                anomaly_score: raw.anomaly,
                fraud_score: raw.fraud,
                composite: aggregated.composite,
                dominant_factor: aggregated.dominant_factor.as_str().to_string(),
                degraded,
                trust_score_delta: delta,
                timestamp: effective_ts,
            },
            trust_score,
            status: status.as_str().to_string(),
            ledger_payload: serde_json::json!({
                "event_id": event_id,
                "product_id": input.product_id,
                "event_type": event_type.as_str(),
                "timestamp": effective_ts,
                "handler_id": input.handler_id,
            }),
        };

        SubmissionRepo::commit(&self.pool, &record).await?;

        self.publish_platform_events(
            &product,
            event_id,
            input.handler_id.as_deref(),
            &resolution.reason,
            resolution.flagged,
            trust_score,
            status,
        );

        Ok(SubmissionOutcome {
            event_id,
            accepted: true,
            flagged: resolution.flagged,
            degraded,
            duplicate: false,
            trust_score,
            status,
            reason: resolution.reason,
            ledger_pending: true,
        })
    }

    /// Obtain raw signals: an embedded snapshot wins; otherwise ask the
    /// scoring collaborator, degrading to neutral scores on failure.
    async fn resolve_signals(
        &self,
        product: &Product,
        input: &NewCheckpoint,
        event_type: EventType,
    ) -> (RawSignals, bool) {
        if let Some(embedded) = &input.ai_results {
            return (RawSignals::from(*embedded), false);
        }

        let location_json = input
            .location
            .map(|l| serde_json::json!({ "lat": l.lat, "lng": l.lng }));
        let request = ScoringRequest {
            product_id: &product.product_id,
            batch_id: &product.batch_id,
            manufacturer_id: &product.manufacturer_id,
            product_metadata: &product.product_metadata,
            event_type: event_type.as_str(),
            location: location_json.as_ref(),
            temperature: input.temperature,
            humidity: input.humidity,
            handler_id: input.handler_id.as_deref(),
        };

        score_or_neutral(self.scoring.as_ref(), product, request).await
    }

    /// Replay the stored outcome for a duplicate `event_id`.
    fn replay(product: &Product, existing: CheckpointEvent) -> SubmissionOutcome {
        SubmissionOutcome {
            event_id: existing.event_id,
            accepted: true,
            flagged: existing.flagged,
            degraded: false,
            duplicate: true,
            trust_score: existing.trust_score_after,
            status: ProductStatus::from_str(&product.status),
            reason: existing.flag_reason,
            ledger_pending: false,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn publish_platform_events(
        &self,
        product: &Product,
        event_id: EventId,
        handler_id: Option<&str>,
        reason: &Option<String>,
        flagged: bool,
        trust_score: f64,
        status: ProductStatus,
    ) {
        let name = if flagged {
            "checkpoint.flagged"
        } else {
            "checkpoint.accepted"
        };
        let mut event = PlatformEvent::new(name)
            .with_subject("event", event_id.to_string())
            .with_payload(serde_json::json!({
                "product_id": product.product_id,
                "trust_score": trust_score,
                "status": status.as_str(),
                "reason": reason,
            }));
        if let Some(handler) = handler_id {
            event = event.with_actor(handler);
        }
        self.bus.publish(event);

        if product.status != status.as_str() {
            self.bus.publish(
                PlatformEvent::new("product.status_changed")
                    .with_subject("product", product.product_id.clone())
                    .with_payload(serde_json::json!({
                        "from": product.status,
                        "to": status.as_str(),
                        "trust_score": trust_score,
                    })),
            );
        }
    }
}

/// Ask the scoring collaborator, degrading to neutral scores on any
/// failure. The submission itself never aborts because a model was slow or
/// down; the substitution is flagged in the stored snapshot and the
/// response.
pub async fn score_or_neutral(
    provider: &dyn ScoringProvider,
    product: &Product,
    request: ScoringRequest<'_>,
) -> (RawSignals, bool) {
    match provider.score(product, request).await {
        Ok(raw) => (raw, false),
        Err(e) => {
            tracing::warn!(
                error = %e,
                product_id = %product.product_id,
                "Scoring collaborator unavailable, substituting neutral scores"
            );
            (RawSignals::neutral(), true)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{NeutralScoring, ScoringError};
    use async_trait::async_trait;

    struct FailingScoring;

    #[async_trait]
    impl ScoringProvider for FailingScoring {
        async fn score(
            &self,
            _product: &Product,
            _request: ScoringRequest<'_>,
        ) -> Result<RawSignals, ScoringError> {
            Err(ScoringError::InvalidResponse("model timed out".to_string()))
        }
    }

    struct FixedScoring(RawSignals);

    #[async_trait]
    impl ScoringProvider for FixedScoring {
        async fn score(
            &self,
            _product: &Product,
            _request: ScoringRequest<'_>,
        ) -> Result<RawSignals, ScoringError> {
            Ok(self.0)
        }
    }

    fn product() -> Product {
        Product {
            product_id: "prod-1".to_string(),
            batch_id: "batch-1".to_string(),
            manufacturer_id: "mfg-1".to_string(),
            product_metadata: serde_json::json!({}),
            dkg_ual: None,
            registration_timestamp: Utc::now(),
            trust_score: 0.0,
            status: "VALID".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn request(p: &Product) -> ScoringRequest<'_> {
        ScoringRequest {
            product_id: &p.product_id,
            batch_id: &p.batch_id,
            manufacturer_id: &p.manufacturer_id,
            product_metadata: &p.product_metadata,
            event_type: "LOADED",
            location: None,
            temperature: None,
            humidity: None,
            handler_id: None,
        }
    }

    #[tokio::test]
    async fn provider_failure_degrades_to_neutral() {
        let p = product();
        let (raw, degraded) = score_or_neutral(&FailingScoring, &p, request(&p)).await;
        assert!(degraded);
        assert_eq!(raw.validation, 0.5);
        assert_eq!(raw.anomaly, 0.5);
        assert_eq!(raw.fraud, 0.5);
    }

    #[tokio::test]
    async fn provider_success_is_not_degraded() {
        let p = product();
        let raw_in = RawSignals {
            validation: 0.9,
            anomaly: 0.1,
            fraud: 0.2,
        };
        let (raw, degraded) = score_or_neutral(&FixedScoring(raw_in), &p, request(&p)).await;
        assert!(!degraded);
        assert_eq!(raw.validation, 0.9);
        assert_eq!(raw.fraud, 0.2);
    }

    #[tokio::test]
    async fn neutral_scoring_returns_all_halves() {
        let p = product();
        let (raw, degraded) = score_or_neutral(&NeutralScoring, &p, request(&p)).await;
        assert!(!degraded);
        assert_eq!(raw.validation, 0.5);
    }

    #[test]
    fn location_bounds_validated() {
        assert!(Location { lat: 52.5, lng: 13.4 }.validate().is_ok());
        assert!(Location { lat: 91.0, lng: 0.0 }.validate().is_err());
        assert!(Location { lat: 0.0, lng: -181.0 }.validate().is_err());
        assert!(Location { lat: -90.0, lng: 180.0 }.validate().is_ok());
    }

    #[test]
    fn embedded_signals_convert_to_raw() {
        let raw: RawSignals = EmbeddedSignals {
            validation_score: 0.8,
            anomaly_score: 0.2,
            fraud_score: 0.1,
        }
        .into();
        assert_eq!(raw.validation, 0.8);
        assert_eq!(raw.anomaly, 0.2);
        assert_eq!(raw.fraud, 0.1);
    }
}
