//! Trust score recomputation and status derivation.
//!
//! The trust score is a derived view: a pure function of the product's
//! ordered event chain and signal snapshots. The stored value is a cache —
//! recomputing from the full log must reproduce it exactly, so a regulator
//! can verify a score independently. Everything here is deterministic:
//! inputs are totally ordered before weighting, and no clock is consulted
//! (ages are relative to the newest event in the chain).
//!
//! Scoring model: an exponentially time-decayed weighted average of event
//! composites, with a half-life favoring recent behavior while keeping old
//! incidents' information content as a floor contribution. Each flagged
//! event subtracts one fixed penalty on top of the average — once, not
//! compounding across recomputations.

use serde::{Deserialize, Serialize};

use crate::config::TrustConfig;
use crate::types::{EventId, Timestamp};

/// Seconds per day, for age conversion.
const SECONDS_PER_DAY: f64 = 86_400.0;

// ---------------------------------------------------------------------------
// ProductStatus
// ---------------------------------------------------------------------------

/// Derived product status, a thresholded view of the trust score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductStatus {
    Valid,
    Warning,
    FraudRisk,
}

impl ProductStatus {
    /// String representation for database storage and the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Valid => "VALID",
            ProductStatus::Warning => "WARNING",
            ProductStatus::FraudRisk => "FRAUD_RISK",
        }
    }

    /// Parse from the stored representation, defaulting to `Warning` for
    /// unknown values (fail toward scrutiny, not trust).
    pub fn from_str(s: &str) -> Self {
        match s {
            "VALID" => ProductStatus::Valid,
            "FRAUD_RISK" => ProductStatus::FraudRisk,
            _ => ProductStatus::Warning,
        }
    }
}

// ---------------------------------------------------------------------------
// ScoredEvent
// ---------------------------------------------------------------------------

/// The per-event slice of history the engine scores over.
///
/// Derivable entirely from persisted rows: an event row plus its optional
/// signal snapshot. `composite` is `None` for events that carry no signal.
#[derive(Debug, Clone, Copy)]
pub struct ScoredEvent {
    pub event_id: EventId,
    pub timestamp: Timestamp,
    pub composite: Option<f64>,
    /// Resolver flag as persisted: structural violation or sub-floor
    /// signal.
    pub flagged: bool,
}

impl ScoredEvent {
    /// Whether this event contributes a flag penalty: structurally flagged,
    /// or signal-damning (composite below the floor) despite structural
    /// acceptance.
    pub fn penalized(&self, signal_floor: f64) -> bool {
        if self.flagged {
            return true;
        }
        matches!(self.composite, Some(c) if c < signal_floor)
    }
}

// ---------------------------------------------------------------------------
// Recompute
// ---------------------------------------------------------------------------

/// Recompute a product's trust score from its full history.
///
/// The history may arrive in any order; it is totally ordered by
/// `(timestamp, event_id)` before scoring so the result is independent of
/// submission order. Weights decay exponentially with age relative to the
/// newest event: `weight = exp(-ln2 * age_days / half_life_days)`.
///
/// Flagged events are excluded from the weighted average (their provenance
/// or signal is the thing in doubt) and contribute one flag penalty each;
/// unflagged events with a composite below `signal_floor` keep their
/// composite in the average and also contribute one penalty.
/// When no composite contributes, the average term falls back to
/// `baseline_composite`. The result is clamped to `[0, 1]`.
pub fn recompute(history: &[ScoredEvent], signal_floor: f64, cfg: &TrustConfig) -> f64 {
    if history.is_empty() {
        return cfg.initial_trust;
    }

    let mut ordered: Vec<&ScoredEvent> = history.iter().collect();
    ordered.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.event_id.cmp(&b.event_id))
    });

    // Non-empty by the guard above; sorted ascending, so the last entry
    // carries the newest timestamp.
    let Some(newest) = ordered.last().map(|e| e.timestamp) else {
        return cfg.initial_trust;
    };

    let lambda = std::f64::consts::LN_2 / cfg.half_life_days;

    let mut weight_sum = 0.0;
    let mut weighted_composites = 0.0;
    let mut penalties = 0usize;

    for event in &ordered {
        if event.penalized(signal_floor) {
            penalties += 1;
        }
        if event.flagged {
            continue;
        }
        let Some(composite) = event.composite else {
            continue;
        };
        let age_days = (newest - event.timestamp).num_seconds() as f64 / SECONDS_PER_DAY;
        let weight = (-lambda * age_days).exp();
        weight_sum += weight;
        weighted_composites += weight * composite;
    }

    let average = if weight_sum > 0.0 {
        weighted_composites / weight_sum
    } else {
        cfg.baseline_composite
    };

    (average - penalties as f64 * cfg.flag_penalty).clamp(0.0, 1.0)
}

/// Map a trust score to its status band.
///
/// Boundaries use `>=` semantics: a score exactly at `valid_threshold` is
/// VALID, exactly at `warning_threshold` is WARNING.
pub fn derive_status(score: f64, cfg: &TrustConfig) -> ProductStatus {
    if score >= cfg.valid_threshold {
        ProductStatus::Valid
    } else if score >= cfg.warning_threshold {
        ProductStatus::Warning
    } else {
        ProductStatus::FraudRisk
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn cfg() -> TrustConfig {
        TrustConfig::default()
    }

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()
    }

    fn event(days: i64, composite: Option<f64>, flagged: bool) -> ScoredEvent {
        ScoredEvent {
            event_id: Uuid::new_v4(),
            timestamp: t0() + Duration::days(days),
            composite,
            flagged,
        }
    }

    const FLOOR: f64 = 0.15;

    // -- ProductStatus --

    #[test]
    fn status_round_trips_through_strings() {
        for s in [
            ProductStatus::Valid,
            ProductStatus::Warning,
            ProductStatus::FraudRisk,
        ] {
            assert_eq!(ProductStatus::from_str(s.as_str()), s);
        }
    }

    #[test]
    fn unknown_status_defaults_to_warning() {
        assert_eq!(ProductStatus::from_str("garbage"), ProductStatus::Warning);
    }

    // -- derive_status --

    #[test]
    fn status_bands_use_gte_semantics() {
        assert_eq!(derive_status(0.7, &cfg()), ProductStatus::Valid);
        assert_eq!(derive_status(0.699, &cfg()), ProductStatus::Warning);
        assert_eq!(derive_status(0.4, &cfg()), ProductStatus::Warning);
        assert_eq!(derive_status(0.399, &cfg()), ProductStatus::FraudRisk);
    }

    #[test]
    fn status_extremes() {
        assert_eq!(derive_status(1.0, &cfg()), ProductStatus::Valid);
        assert_eq!(derive_status(0.0, &cfg()), ProductStatus::FraudRisk);
    }

    // -- recompute basics --

    #[test]
    fn empty_history_returns_initial_trust() {
        assert_eq!(recompute(&[], FLOOR, &cfg()), cfg().initial_trust);
    }

    #[test]
    fn single_clean_event_scores_its_composite() {
        // A product's first checkpoint with strong signals: composite 0.9
        // yields trust 0.9 and VALID status.
        let history = [event(0, Some(0.9), false)];
        let score = recompute(&history, FLOOR, &cfg());
        assert!((score - 0.9).abs() < 1e-12);
        assert_eq!(derive_status(score, &cfg()), ProductStatus::Valid);
    }

    #[test]
    fn events_without_signals_do_not_contribute() {
        let history = [event(0, Some(0.8), false), event(1, None, false)];
        let score = recompute(&history, FLOOR, &cfg());
        assert!((score - 0.8).abs() < 1e-12);
    }

    #[test]
    fn flag_only_history_penalizes_baseline() {
        let history = [event(0, None, true)];
        let score = recompute(&history, FLOOR, &cfg());
        // baseline 0.5 minus one penalty 0.15
        assert!((score - 0.35).abs() < 1e-12);
    }

    // -- determinism --

    #[test]
    fn recompute_is_idempotent() {
        let history = [
            event(0, Some(0.9), false),
            event(3, Some(0.4), false),
            event(9, None, true),
            event(12, Some(0.7), false),
        ];
        let a = recompute(&history, FLOOR, &cfg());
        let b = recompute(&history, FLOOR, &cfg());
        assert_eq!(a, b);
    }

    #[test]
    fn recompute_is_order_independent() {
        let e1 = event(0, Some(0.9), false);
        let e2 = event(5, Some(0.3), false);
        let e3 = event(10, Some(0.7), true);

        let forward = recompute(&[e1, e2, e3], FLOOR, &cfg());
        let reversed = recompute(&[e3, e2, e1], FLOOR, &cfg());
        let shuffled = recompute(&[e2, e3, e1], FLOOR, &cfg());
        assert_eq!(forward, reversed);
        assert_eq!(forward, shuffled);
    }

    #[test]
    fn equal_timestamps_tie_break_on_event_id() {
        let mut a = event(0, Some(0.2), false);
        let mut b = event(0, Some(0.9), false);
        a.event_id = Uuid::from_u128(1);
        b.event_id = Uuid::from_u128(2);

        let x = recompute(&[a, b], FLOOR, &cfg());
        let y = recompute(&[b, a], FLOOR, &cfg());
        assert_eq!(x, y);
    }

    // -- decay --

    #[test]
    fn recent_events_outweigh_old_events() {
        // Old bad signal, fresh good signal: score leans toward the good.
        let history = [event(0, Some(0.2), false), event(60, Some(0.9), false)];
        let score = recompute(&history, FLOOR, &cfg());
        assert!(score > 0.7, "got {score}");
    }

    #[test]
    fn older_negative_signal_hurts_less() {
        // Identical histories except the age of the one bad signal: the
        // history whose incident is older must score at least as high.
        let recent_incident = [event(0, Some(0.9), false), event(29, Some(0.2), false)];
        let old_incident = [event(0, Some(0.2), false), event(29, Some(0.9), false)];

        let recent = recompute(&recent_incident, FLOOR, &cfg());
        let old = recompute(&old_incident, FLOOR, &cfg());
        assert!(old >= recent, "old {old} < recent {recent}");
    }

    #[test]
    fn half_life_halves_weight() {
        // Two events one half-life apart with composites 1.0 and 0.0:
        // weights are 0.5 (old) and 1.0 (new), so the average is 1/3.
        let history = [event(0, Some(1.0), false), event(30, Some(0.0), false)];
        let score = recompute(&history, FLOOR, &cfg());
        assert!((score - 1.0 / 3.0).abs() < 1e-9, "got {score}");
    }

    #[test]
    fn old_incidents_never_fully_erased() {
        // A year-old zero composite still drags the score below perfect.
        let history = [event(0, Some(0.0), false), event(365, Some(1.0), false)];
        let score = recompute(&history, FLOOR, &cfg());
        assert!(score < 1.0);
    }

    // -- penalties --

    #[test]
    fn flagged_event_reduces_score_by_exactly_one_penalty() {
        // Clean chain at 0.9; a flagged event whose composite is excluded
        // drops the score by exactly the penalty.
        let clean = [event(0, Some(0.9), false)];
        let before = recompute(&clean, FLOOR, &cfg());

        let with_flag = [event(0, Some(0.9), false), event(1, Some(0.6), true)];
        let after = recompute(&with_flag, FLOOR, &cfg());
        assert!((before - after - cfg().flag_penalty).abs() < 1e-12);
    }

    #[test]
    fn penalty_does_not_compound_across_recomputations() {
        let history = [event(0, Some(0.9), false), event(1, Some(0.6), true)];
        let first = recompute(&history, FLOOR, &cfg());
        let second = recompute(&history, FLOOR, &cfg());
        let third = recompute(&history, FLOOR, &cfg());
        assert_eq!(first, second);
        assert_eq!(second, third);
    }

    #[test]
    fn each_flag_contributes_one_penalty() {
        let history = [
            event(0, Some(0.9), false),
            event(1, None, true),
            event(2, None, true),
        ];
        let score = recompute(&history, FLOOR, &cfg());
        assert!((score - (0.9 - 2.0 * 0.15)).abs() < 1e-12);
    }

    #[test]
    fn sub_floor_composite_penalized_but_still_weighted() {
        // One clean event at 0.9, one accepted event with a damning 0.1
        // composite: the 0.1 stays in the average and adds a penalty.
        let history = [event(0, Some(0.9), false), event(0, Some(0.1), false)];
        // Same timestamp, so both weights are 1.0: average 0.5, minus one
        // penalty.
        let score = recompute(&history, FLOOR, &cfg());
        assert!((score - 0.35).abs() < 1e-12, "got {score}");
    }

    #[test]
    fn score_floors_at_zero() {
        let history = [
            event(0, Some(0.1), true),
            event(1, None, true),
            event(2, None, true),
            event(3, None, true),
        ];
        assert_eq!(recompute(&history, FLOOR, &cfg()), 0.0);
    }

    #[test]
    fn score_never_exceeds_one() {
        let history = [event(0, Some(1.0), false), event(1, Some(1.0), false)];
        assert!(recompute(&history, FLOOR, &cfg()) <= 1.0);
    }

    // -- penalized helper --

    #[test]
    fn penalized_matches_flag_and_floor_rules() {
        assert!(event(0, None, true).penalized(FLOOR));
        assert!(event(0, Some(0.1), false).penalized(FLOOR));
        assert!(!event(0, Some(0.15), false).penalized(FLOOR));
        assert!(!event(0, Some(0.9), false).penalized(FLOOR));
        assert!(!event(0, None, false).penalized(FLOOR));
    }
}
