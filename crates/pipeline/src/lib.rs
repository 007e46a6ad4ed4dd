//! Submission orchestration for checkpoint events.
//!
//! This crate owns the full life of a submission: per-product
//! serialization, chain validation, signal scoring, conflict resolution,
//! trust recomputation, and the atomic persistence hand-off. It also owns
//! the collaborator boundaries — the scoring model and the DKG ledger are
//! pluggable trait objects, never concrete dependencies of the engine.
//!
//! - [`SubmissionPipeline`] — the request-path orchestrator.
//! - [`ScoringProvider`] / [`LedgerProvider`] — collaborator interfaces.
//! - [`ProductLocks`] — per-product mutual exclusion (no global lock).
//! - [`LedgerSyncService`] — background drain of the ledger write queue.

pub mod ledger;
pub mod locks;
pub mod scoring;
pub mod submit;
pub mod sync;

pub use ledger::{AssetRef, HttpLedger, LedgerError, LedgerProvider, NoopLedger};
pub use locks::ProductLocks;
pub use scoring::{HttpScoring, NeutralScoring, ScoringError, ScoringProvider};
pub use submit::{NewCheckpoint, SubmissionOutcome, SubmissionPipeline, SubmitError};
pub use sync::LedgerSyncService;
