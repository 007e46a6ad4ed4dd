//! TrustChain platform event bus and audit infrastructure.
//!
//! - [`EventBus`] — in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`] — the canonical domain event envelope
//!   (`product.registered`, `checkpoint.flagged`, ...).
//! - [`AuditPersistence`] — background service that durably writes every
//!   event to the `audit_logs` table.

pub mod bus;
pub mod persistence;

pub use bus::{EventBus, PlatformEvent};
pub use persistence::AuditPersistence;
