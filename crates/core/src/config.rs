//! Engine configuration.
//!
//! All tunables of the trust engine live here with their defaults. Nothing
//! downstream hardcodes a constant: the API binary builds an [`EngineConfig`]
//! from environment overrides and validates it once at startup.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Tolerance for floating point weight-sum comparison.
const WEIGHT_SUM_EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// SignalWeights
// ---------------------------------------------------------------------------

/// Weights for combining the three raw signals into a composite.
///
/// Anomaly and fraud are inverted before weighting, so all three terms are
/// "supportive" (higher is better). The weights must sum to 1.0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SignalWeights {
    pub validation: f64,
    pub anomaly: f64,
    pub fraud: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            validation: 0.4,
            anomaly: 0.3,
            fraud: 0.3,
        }
    }
}

impl SignalWeights {
    /// Validate that each weight is in `[0, 1]` and the sum is exactly 1.0
    /// (within floating point tolerance).
    pub fn validate(&self) -> Result<(), CoreError> {
        for (name, w) in [
            ("validation", self.validation),
            ("anomaly", self.anomaly),
            ("fraud", self.fraud),
        ] {
            if !(0.0..=1.0).contains(&w) {
                return Err(CoreError::Configuration(format!(
                    "signal weight '{name}' must be between 0.0 and 1.0, got {w}"
                )));
            }
        }
        let sum = self.validation + self.anomaly + self.fraud;
        if (sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(CoreError::Configuration(format!(
                "signal weights must sum to 1.0, got {sum}"
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TrustConfig
// ---------------------------------------------------------------------------

/// Tunables for trust score recomputation and status derivation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrustConfig {
    /// Days after which a signal's weight halves.
    pub half_life_days: f64,
    /// Penalty subtracted once per flagged event.
    pub flag_penalty: f64,
    /// Composite used when a history carries no usable signal snapshots.
    pub baseline_composite: f64,
    /// Scores at or above this are VALID.
    pub valid_threshold: f64,
    /// Scores at or above this (but below `valid_threshold`) are WARNING.
    pub warning_threshold: f64,
    /// Trust score assigned at registration when the caller supplies none.
    pub initial_trust: f64,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            half_life_days: 30.0,
            flag_penalty: 0.15,
            baseline_composite: 0.5,
            valid_threshold: 0.7,
            warning_threshold: 0.4,
            initial_trust: 0.0,
        }
    }
}

impl TrustConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.half_life_days <= 0.0 {
            return Err(CoreError::Configuration(format!(
                "half_life_days must be positive, got {}",
                self.half_life_days
            )));
        }
        for (name, v) in [
            ("flag_penalty", self.flag_penalty),
            ("baseline_composite", self.baseline_composite),
            ("valid_threshold", self.valid_threshold),
            ("warning_threshold", self.warning_threshold),
            ("initial_trust", self.initial_trust),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(CoreError::Configuration(format!(
                    "{name} must be between 0.0 and 1.0, got {v}"
                )));
            }
        }
        if self.valid_threshold < self.warning_threshold {
            return Err(CoreError::Configuration(format!(
                "valid_threshold ({}) must be >= warning_threshold ({})",
                self.valid_threshold, self.warning_threshold
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ResolverConfig
// ---------------------------------------------------------------------------

/// Tunables for the conflict & anomaly resolver.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Composites below this floor are treated as flags even on
    /// structurally accepted events.
    pub signal_floor: f64,
    /// Length of the rolling flag window, in days.
    pub flag_window_days: i64,
    /// Flags tolerated within the window before the status is forced to
    /// FRAUD_RISK.
    pub max_flags_in_window: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            signal_floor: 0.15,
            flag_window_days: 30,
            max_flags_in_window: 3,
        }
    }
}

impl ResolverConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(0.0..=1.0).contains(&self.signal_floor) {
            return Err(CoreError::Configuration(format!(
                "signal_floor must be between 0.0 and 1.0, got {}",
                self.signal_floor
            )));
        }
        if self.flag_window_days <= 0 {
            return Err(CoreError::Configuration(format!(
                "flag_window_days must be positive, got {}",
                self.flag_window_days
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Complete engine configuration: signal weighting, trust scoring, conflict
/// resolution, and chain skew tolerance.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub weights: SignalWeights,
    pub trust: TrustConfig,
    pub resolver: ResolverConfig,
    /// Seconds a new event's timestamp may precede the newest accepted
    /// event before the chain validator flags it. Zero means strict
    /// monotonicity.
    #[serde(default)]
    pub skew_tolerance_secs: i64,
}

impl EngineConfig {
    /// Validate every section. Called once at startup; a misconfigured
    /// engine must not serve traffic.
    pub fn validate(&self) -> Result<(), CoreError> {
        self.weights.validate()?;
        self.trust.validate()?;
        self.resolver.validate()?;
        if self.skew_tolerance_secs < 0 {
            return Err(CoreError::Configuration(format!(
                "skew_tolerance_secs must be >= 0, got {}",
                self.skew_tolerance_secs
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn default_weights_sum_to_one() {
        let w = SignalWeights::default();
        assert!((w.validation + w.anomaly + w.fraud - 1.0).abs() < WEIGHT_SUM_EPSILON);
    }

    #[test]
    fn weights_not_summing_to_one_rejected() {
        let w = SignalWeights {
            validation: 0.5,
            anomaly: 0.3,
            fraud: 0.3,
        };
        let err = w.validate().unwrap_err();
        assert!(err.to_string().contains("must sum to 1.0"));
    }

    #[test]
    fn negative_weight_rejected() {
        let w = SignalWeights {
            validation: -0.1,
            anomaly: 0.6,
            fraud: 0.5,
        };
        assert!(w.validate().is_err());
    }

    #[test]
    fn zero_half_life_rejected() {
        let cfg = TrustConfig {
            half_life_days: 0.0,
            ..TrustConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn thresholds_out_of_order_rejected() {
        let cfg = TrustConfig {
            valid_threshold: 0.3,
            warning_threshold: 0.6,
            ..TrustConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn penalty_above_one_rejected() {
        let cfg = TrustConfig {
            flag_penalty: 1.5,
            ..TrustConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_flag_window_rejected() {
        let cfg = ResolverConfig {
            flag_window_days: 0,
            ..ResolverConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn negative_skew_tolerance_rejected() {
        let cfg = EngineConfig {
            skew_tolerance_secs: -1,
            ..EngineConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
