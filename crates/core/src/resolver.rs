//! Conflict and anomaly resolution.
//!
//! The resolver turns a chain decision plus an aggregated signal into the
//! final submission outcome: whether the event is persisted, whether it is
//! flagged, and whether repeated inconsistency forces the product's status
//! to FRAUD_RISK regardless of the computed score. Repeated flags within a
//! rolling window are a stronger signal than any single score.

use serde::Serialize;

use crate::chain::ChainDecision;
use crate::config::ResolverConfig;
use crate::signal::NormalizedSignal;
use crate::trust::{ProductStatus, ScoredEvent};
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// ResolutionOutcome
// ---------------------------------------------------------------------------

/// The resolver's verdict on a single submission.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionOutcome {
    /// False only for hard rejections; the event is then never persisted.
    pub accept_event: bool,
    /// True when the event is persisted with a flag penalty.
    pub flagged: bool,
    /// Forced status overriding the score-derived one, when the rolling
    /// flag window is saturated.
    pub status_override: Option<ProductStatus>,
    /// Human-readable reason for a reject or flag.
    pub reason: Option<String>,
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Count the flags within the rolling window ending at `now`.
///
/// Pure over persisted history: an event counts when it is structurally
/// flagged or carries a sub-floor composite (the same rule the trust engine
/// penalizes by), and its timestamp falls inside the window.
pub fn count_recent_flags(
    history: &[ScoredEvent],
    now: Timestamp,
    cfg: &ResolverConfig,
) -> usize {
    let cutoff = now - chrono::Duration::days(cfg.flag_window_days);
    history
        .iter()
        .filter(|e| e.timestamp > cutoff && e.timestamp <= now)
        .filter(|e| e.penalized(cfg.signal_floor))
        .count()
}

/// Resolve a validated, scored submission into its final outcome.
///
/// `prior_flags_in_window` is the rolling-window flag count over the
/// already-persisted chain (see [`count_recent_flags`]); the candidate is
/// added here when it is itself flagged.
pub fn resolve(
    decision: &ChainDecision,
    signal: &NormalizedSignal,
    prior_flags_in_window: usize,
    cfg: &ResolverConfig,
) -> ResolutionOutcome {
    if let ChainDecision::Reject { reason } = decision {
        return ResolutionOutcome {
            accept_event: false,
            flagged: false,
            status_override: None,
            reason: Some(reason.clone()),
        };
    }

    let (mut flagged, mut reason) = match decision {
        ChainDecision::Flag { reason } => (true, Some(reason.clone())),
        _ => (false, None),
    };

    // A structurally valid but signal-damning event still triggers
    // scrutiny.
    if !flagged && signal.composite < cfg.signal_floor {
        flagged = true;
        reason = Some(format!(
            "composite signal {:.3} below floor {:.3}",
            signal.composite, cfg.signal_floor
        ));
    }

    let flags_in_window = prior_flags_in_window + usize::from(flagged);
    let status_override = if flags_in_window > cfg.max_flags_in_window {
        Some(ProductStatus::FraudRisk)
    } else {
        None
    };

    ResolutionOutcome {
        accept_event: true,
        flagged,
        status_override,
        reason,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
