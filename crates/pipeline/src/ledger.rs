//! Ledger (DKG) collaborator interface.
//!
//! The decentralized knowledge graph mirroring product data is an external
//! system reached through this trait. All writes are best-effort: the
//! request path enqueues durable jobs and [`LedgerSyncService`]
//! (crate::sync) drains them, so ledger unavailability never blocks or
//! fails a local trust computation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use uuid::Uuid;

/// Ledger collaborator failure.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("ledger response invalid: {0}")]
    InvalidResponse(String),
}

/// Unique asset locator referencing a ledger-stored asset. Opaque to the
/// engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef(pub String);

impl AssetRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Pluggable ledger boundary.
#[async_trait]
pub trait LedgerProvider: Send + Sync {
    /// Publish a product snapshot as a new asset, returning its locator.
    async fn publish(&self, product: &serde_json::Value) -> Result<AssetRef, LedgerError>;

    /// Append an event to an existing asset.
    async fn append(&self, asset: &AssetRef, event: &serde_json::Value)
        -> Result<(), LedgerError>;

    /// Fetch the current ledger view of an asset.
    async fn query(&self, asset: &AssetRef) -> Result<serde_json::Value, LedgerError>;
}

// ---------------------------------------------------------------------------
// NoopLedger
// ---------------------------------------------------------------------------

/// Ledger provider for development and tests: publishes mint a locator
/// locally and every write succeeds without leaving the process.
pub struct NoopLedger;

#[async_trait]
impl LedgerProvider for NoopLedger {
    async fn publish(&self, _product: &serde_json::Value) -> Result<AssetRef, LedgerError> {
        Ok(AssetRef(format!("dkg:asset:{}", Uuid::new_v4())))
    }

    async fn append(
        &self,
        _asset: &AssetRef,
        _event: &serde_json::Value,
    ) -> Result<(), LedgerError> {
        Ok(())
    }

    async fn query(&self, asset: &AssetRef) -> Result<serde_json::Value, LedgerError> {
        Ok(serde_json::json!({ "ual": asset.as_str(), "data": serde_json::Value::Null }))
    }
}

// ---------------------------------------------------------------------------
// HttpLedger
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PublishResponse {
    ual: String,
}

/// Ledger provider backed by an HTTP DKG gateway.
pub struct HttpLedger {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLedger {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl LedgerProvider for HttpLedger {
    async fn publish(&self, product: &serde_json::Value) -> Result<AssetRef, LedgerError> {
        let response: PublishResponse = self
            .client
            .post(format!("{}/assets", self.base_url))
            .json(product)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.ual.is_empty() {
            return Err(LedgerError::InvalidResponse("empty UAL".to_string()));
        }
        Ok(AssetRef(response.ual))
    }

    async fn append(
        &self,
        asset: &AssetRef,
        event: &serde_json::Value,
    ) -> Result<(), LedgerError> {
        self.client
            .post(format!("{}/assets/{}/events", self.base_url, asset.as_str()))
            .json(event)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn query(&self, asset: &AssetRef) -> Result<serde_json::Value, LedgerError> {
        let value = self
            .client
            .get(format!("{}/assets/{}", self.base_url, asset.as_str()))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(value)
    }
}
