//! Signal normalization and aggregation.
//!
//! Scoring collaborators produce three independent scores per event, each in
//! `[0, 1]`: a validation score (higher is better) and anomaly/fraud scores
//! (higher is worse). The aggregator inverts the adverse pair and combines
//! all three into one supportive composite via a weighted average, and names
//! the raw input that dominated the result for explainability.

use serde::{Deserialize, Serialize};

use crate::config::SignalWeights;
use crate::error::CoreError;

/// Neutral value substituted for each signal when scoring is degraded.
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Baseline a raw signal is compared against when picking the dominant
/// factor.
const DOMINANT_BASELINE: f64 = 0.5;

// ---------------------------------------------------------------------------
// RawSignals
// ---------------------------------------------------------------------------

/// Raw per-event signal scores as produced by a scoring collaborator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RawSignals {
    /// Supportive: higher means the event data looks legitimate.
    pub validation: f64,
    /// Adverse: higher means more anomalous.
    pub anomaly: f64,
    /// Adverse: higher means more fraud-like.
    pub fraud: f64,
}

impl RawSignals {
    /// The neutral fallback used when the scoring collaborator is
    /// unavailable.
    pub fn neutral() -> Self {
        Self {
            validation: NEUTRAL_SCORE,
            anomaly: NEUTRAL_SCORE,
            fraud: NEUTRAL_SCORE,
        }
    }

    /// Validate that every score is in `[0, 1]`.
    pub fn validate(&self) -> Result<(), CoreError> {
        for (name, v) in [
            ("validation_score", self.validation),
            ("anomaly_score", self.anomaly),
            ("fraud_score", self.fraud),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(CoreError::Validation(format!(
                    "{name} must be between 0.0 and 1.0, got {v}"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// DominantFactor
// ---------------------------------------------------------------------------

/// The raw input that deviated most from its neutral baseline.
///
/// Ties break in declaration order so the choice is deterministic for
/// audit replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DominantFactor {
    Validation,
    Anomaly,
    Fraud,
}

impl DominantFactor {
    /// String representation for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            DominantFactor::Validation => "validation",
            DominantFactor::Anomaly => "anomaly",
            DominantFactor::Fraud => "fraud",
        }
    }

    /// Parse from a string, defaulting to `Validation` for unknown values.
    pub fn from_str(s: &str) -> Self {
        match s {
            "anomaly" => DominantFactor::Anomaly,
            "fraud" => DominantFactor::Fraud,
            _ => DominantFactor::Validation,
        }
    }
}

// ---------------------------------------------------------------------------
// NormalizedSignal
// ---------------------------------------------------------------------------

/// A single supportive composite derived from the three raw signals.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NormalizedSignal {
    /// Weighted supportive composite in `[0, 1]`; higher is better.
    pub composite: f64,
    /// Which raw input drove the result furthest from neutral.
    pub dominant_factor: DominantFactor,
    /// True when the raw signals are neutral fallbacks rather than real
    /// collaborator output.
    pub degraded: bool,
}

/// Combine raw signals into a [`NormalizedSignal`].
///
/// Anomaly and fraud are inverted (`1 - score`) before weighting so the
/// composite is supportive throughout. The caller is expected to have
/// validated `weights` at startup; raw scores are validated here because
/// they arrive from collaborators and request payloads.
pub fn aggregate(
    raw: &RawSignals,
    weights: &SignalWeights,
    degraded: bool,
) -> Result<NormalizedSignal, CoreError> {
    raw.validate()?;

    let composite = weights.validation * raw.validation
        + weights.anomaly * (1.0 - raw.anomaly)
        + weights.fraud * (1.0 - raw.fraud);

    Ok(NormalizedSignal {
        composite: composite.clamp(0.0, 1.0),
        dominant_factor: dominant_factor(raw),
        degraded,
    })
}

/// Pick the raw input with the largest deviation from the 0.5 baseline.
fn dominant_factor(raw: &RawSignals) -> DominantFactor {
    let candidates = [
        (DominantFactor::Validation, raw.validation),
        (DominantFactor::Anomaly, raw.anomaly),
        (DominantFactor::Fraud, raw.fraud),
    ];

    let mut best = candidates[0].0;
    let mut best_deviation = (candidates[0].1 - DOMINANT_BASELINE).abs();
    for (factor, value) in &candidates[1..] {
        let deviation = (value - DOMINANT_BASELINE).abs();
        if deviation > best_deviation {
            best = *factor;
            best_deviation = deviation;
        }
    }
    best
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn default_weights() -> SignalWeights {
        SignalWeights::default()
    }

    // -- aggregate --

    #[test]
    fn uniformly_good_signals_produce_high_composite() {
        let raw = RawSignals {
            validation: 0.9,
            anomaly: 0.1,
            fraud: 0.1,
        };
        let signal = aggregate(&raw, &default_weights(), false).unwrap();
        // 0.4*0.9 + 0.3*0.9 + 0.3*0.9 = 0.9
        assert!((signal.composite - 0.9).abs() < 1e-12);
        assert!(!signal.degraded);
    }

    #[test]
    fn adverse_signals_are_inverted() {
        let raw = RawSignals {
            validation: 0.5,
            anomaly: 1.0,
            fraud: 1.0,
        };
        let signal = aggregate(&raw, &default_weights(), false).unwrap();
        // 0.4*0.5 + 0.3*0.0 + 0.3*0.0 = 0.2
        assert!((signal.composite - 0.2).abs() < 1e-12);
    }

    #[test]
    fn neutral_signals_produce_neutral_composite() {
        let signal = aggregate(&RawSignals::neutral(), &default_weights(), true).unwrap();
        assert!((signal.composite - 0.5).abs() < 1e-12);
        assert!(signal.degraded);
    }

    #[test]
    fn out_of_range_score_rejected() {
        let raw = RawSignals {
            validation: 1.1,
            anomaly: 0.5,
            fraud: 0.5,
        };
        assert!(aggregate(&raw, &default_weights(), false).is_err());

        let raw = RawSignals {
            validation: 0.5,
            anomaly: -0.1,
            fraud: 0.5,
        };
        assert!(aggregate(&raw, &default_weights(), false).is_err());
    }

    #[test]
    fn custom_weights_respected() {
        let weights = SignalWeights {
            validation: 1.0,
            anomaly: 0.0,
            fraud: 0.0,
        };
        let raw = RawSignals {
            validation: 0.7,
            anomaly: 1.0,
            fraud: 1.0,
        };
        let signal = aggregate(&raw, &weights, false).unwrap();
        assert!((signal.composite - 0.7).abs() < 1e-12);
    }

    // -- dominant factor --

    #[test]
    fn dominant_factor_picks_largest_deviation() {
        let raw = RawSignals {
            validation: 0.6,
            anomaly: 0.95,
            fraud: 0.55,
        };
        let signal = aggregate(&raw, &default_weights(), false).unwrap();
        assert_eq!(signal.dominant_factor, DominantFactor::Anomaly);
    }

    #[test]
    fn dominant_factor_counts_deviation_in_both_directions() {
        // A very low validation score deviates further than mild anomaly.
        let raw = RawSignals {
            validation: 0.05,
            anomaly: 0.6,
            fraud: 0.6,
        };
        let signal = aggregate(&raw, &default_weights(), false).unwrap();
        assert_eq!(signal.dominant_factor, DominantFactor::Validation);
    }

    #[test]
    fn dominant_factor_tie_breaks_in_declaration_order() {
        let raw = RawSignals {
            validation: 0.9,
            anomaly: 0.1,
            fraud: 0.1,
        };
        let signal = aggregate(&raw, &default_weights(), false).unwrap();
        assert_eq!(signal.dominant_factor, DominantFactor::Validation);
    }

    #[test]
    fn dominant_factor_round_trips_through_strings() {
        for f in [
            DominantFactor::Validation,
            DominantFactor::Anomaly,
            DominantFactor::Fraud,
        ] {
            assert_eq!(DominantFactor::from_str(f.as_str()), f);
        }
    }
}
