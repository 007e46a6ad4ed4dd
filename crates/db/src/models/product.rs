//! Product entity model.

use serde::Serialize;
use sqlx::FromRow;
use trustchain_core::types::Timestamp;

/// A row from the `products` table.
///
/// `product_id`, `batch_id`, `manufacturer_id`, and
/// `registration_timestamp` are immutable after registration; `trust_score`
/// and `status` are owned by the trust engine and change on every accepted
/// event. Products are never deleted (append-only audit requirement).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Product {
    pub product_id: String,
    pub batch_id: String,
    pub manufacturer_id: String,
    pub product_metadata: serde_json::Value,
    /// Unique asset locator on the external ledger, set once the publish
    /// queue entry completes.
    pub dkg_ual: Option<String>,
    pub registration_timestamp: Timestamp,
    pub trust_score: f64,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Insert payload for a new product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub product_id: String,
    pub batch_id: String,
    pub manufacturer_id: String,
    pub product_metadata: serde_json::Value,
    pub registration_timestamp: Timestamp,
    pub trust_score: f64,
    pub status: String,
}
