//! Scoring collaborator interface.
//!
//! The machine-learning model behind validation/anomaly/fraud scoring is an
//! external collaborator. The engine only sees this trait; a provider
//! failure never aborts a submission — the pipeline substitutes neutral
//! scores and marks the snapshot degraded.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use trustchain_core::signal::RawSignals;
use trustchain_db::models::product::Product;

/// Scoring collaborator failure.
#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error("scoring request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("scoring response invalid: {0}")]
    InvalidResponse(String),
}

/// Event data handed to the scoring collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct ScoringRequest<'a> {
    pub product_id: &'a str,
    pub batch_id: &'a str,
    pub manufacturer_id: &'a str,
    pub product_metadata: &'a serde_json::Value,
    pub event_type: &'a str,
    pub location: Option<&'a serde_json::Value>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub handler_id: Option<&'a str>,
}

/// Pluggable scoring model boundary.
#[async_trait]
pub trait ScoringProvider: Send + Sync {
    /// Produce raw signal scores for an event, each in `[0, 1]`.
    async fn score(
        &self,
        product: &Product,
        request: ScoringRequest<'_>,
    ) -> Result<RawSignals, ScoringError>;
}

// ---------------------------------------------------------------------------
// NeutralScoring
// ---------------------------------------------------------------------------

/// Scoring provider that always returns neutral scores. Used for local
/// development and tests; results are indistinguishable from a degraded
/// fallback except for the `degraded` marker.
pub struct NeutralScoring;

#[async_trait]
impl ScoringProvider for NeutralScoring {
    async fn score(
        &self,
        _product: &Product,
        _request: ScoringRequest<'_>,
    ) -> Result<RawSignals, ScoringError> {
        Ok(RawSignals::neutral())
    }
}

// ---------------------------------------------------------------------------
// HttpScoring
// ---------------------------------------------------------------------------

/// Wire shape of a scoring service response.
#[derive(Debug, Deserialize)]
struct ScoringResponse {
    validation_score: f64,
    anomaly_score: f64,
    fraud_score: f64,
}

/// Scoring provider backed by an HTTP model service.
pub struct HttpScoring {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpScoring {
    /// Build a client for the given scoring endpoint with a hard request
    /// timeout. A slow model must degrade the submission, not stall it.
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl ScoringProvider for HttpScoring {
    async fn score(
        &self,
        _product: &Product,
        request: ScoringRequest<'_>,
    ) -> Result<RawSignals, ScoringError> {
        let response: ScoringResponse = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let raw = RawSignals {
            validation: response.validation_score,
            anomaly: response.anomaly_score,
            fraud: response.fraud_score,
        };
        raw.validate()
            .map_err(|e| ScoringError::InvalidResponse(e.to_string()))?;
        Ok(raw)
    }
}
