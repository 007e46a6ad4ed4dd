//! Chain consistency validation for checkpoint events.
//!
//! Custody of a product moves in legs: it is LOADED by a handler, undergoes
//! one or more TRANSFERs, is UNLOADED, and finally CHECKINs at a facility.
//! A CHECKIN closes the leg; the next leg re-enters at LOADED. Physical
//! scans get lost in the real world, so a transition that does not match
//! the state machine is flagged for the resolver rather than hard-rejected.
//! The only hard rejection is an event that predates the product's
//! registration — no custody event can precede the product's existence.
//!
//! [`validate_event`] is a pure function over the supplied chain state; the
//! caller owns persistence of the decision.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// EventType
// ---------------------------------------------------------------------------

/// The kind of custody checkpoint being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Loaded,
    Unloaded,
    Transfer,
    Checkin,
}

impl EventType {
    /// String representation for database storage and the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Loaded => "LOADED",
            EventType::Unloaded => "UNLOADED",
            EventType::Transfer => "TRANSFER",
            EventType::Checkin => "CHECKIN",
        }
    }

    /// Parse from the wire/database representation.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "LOADED" => Ok(EventType::Loaded),
            "UNLOADED" => Ok(EventType::Unloaded),
            "TRANSFER" => Ok(EventType::Transfer),
            "CHECKIN" => Ok(EventType::Checkin),
            other => Err(CoreError::Validation(format!(
                "Unknown event type: '{other}'. Valid types: LOADED, UNLOADED, TRANSFER, CHECKIN"
            ))),
        }
    }

    /// Event types allowed to follow this one within a custody leg.
    ///
    /// TRANSFER is re-enterable (multi-hop transit); CHECKIN closes the leg
    /// and the next leg re-enters at LOADED.
    pub fn allowed_successors(&self) -> &'static [EventType] {
        match self {
            EventType::Loaded => &[EventType::Transfer],
            EventType::Transfer => &[EventType::Transfer, EventType::Unloaded],
            EventType::Unloaded => &[EventType::Checkin, EventType::Loaded],
            EventType::Checkin => &[EventType::Loaded],
        }
    }
}

// ---------------------------------------------------------------------------
// ChainDecision
// ---------------------------------------------------------------------------

/// Outcome of validating a candidate event against a product's chain.
///
/// `Reject` means the event must not be persisted. `Flag` means the event is
/// persisted but penalized and tracked for repeated-offense escalation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainDecision {
    Accept,
    Flag { reason: String },
    Reject { reason: String },
}

impl ChainDecision {
    pub fn is_reject(&self) -> bool {
        matches!(self, ChainDecision::Reject { .. })
    }

    pub fn is_flag(&self) -> bool {
        matches!(self, ChainDecision::Flag { .. })
    }

    /// The reason string, if the decision carries one.
    pub fn reason(&self) -> Option<&str> {
        match self {
            ChainDecision::Accept => None,
            ChainDecision::Flag { reason } | ChainDecision::Reject { reason } => Some(reason),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A link of the already-accepted chain, newest last.
#[derive(Debug, Clone, Copy)]
pub struct ChainLink {
    pub event_type: EventType,
    pub timestamp: Timestamp,
}

/// Validate a candidate event against the product's accepted chain.
///
/// Checks, in order:
/// 1. the candidate must not predate `registration` (hard reject);
/// 2. the candidate must not precede the newest accepted event by more than
///    `skew_tolerance` (flag — out-of-order arrival within tolerance is
///    accepted silently);
/// 3. the transition from the last event type must be in the successor
///    table (flag).
pub fn validate_event(
    registration: Timestamp,
    chain: &[ChainLink],
    event_type: EventType,
    timestamp: Timestamp,
    skew_tolerance: Duration,
) -> ChainDecision {
    if timestamp < registration {
        return ChainDecision::Reject {
            reason: format!(
                "event timestamp {timestamp} predates product registration at {registration}"
            ),
        };
    }

    let Some(last) = chain.last() else {
        // First event of the first leg. Anything but LOADED is suspicious
        // but survivable (the loading scan may simply have been missed).
        if event_type == EventType::Loaded {
            return ChainDecision::Accept;
        }
        return ChainDecision::Flag {
            reason: format!(
                "chain starts with {} instead of LOADED",
                event_type.as_str()
            ),
        };
    };

    if timestamp + skew_tolerance < last.timestamp {
        return ChainDecision::Flag {
            reason: format!(
                "event timestamp {timestamp} precedes the latest accepted event at {} beyond tolerance",
                last.timestamp
            ),
        };
    }

    if !last.event_type.allowed_successors().contains(&event_type) {
        return ChainDecision::Flag {
            reason: format!(
                "transition {} -> {} does not match the custody state machine",
                last.event_type.as_str(),
                event_type.as_str()
            ),
        };
    }

    ChainDecision::Accept
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    fn ts(hour: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 1, hour, 0, 0).unwrap()
    }

    fn link(event_type: EventType, hour: u32) -> ChainLink {
        ChainLink {
            event_type,
            timestamp: ts(hour),
        }
    }

    fn no_skew() -> Duration {
        Duration::zero()
    }

    // -- EventType --

    #[test]
    fn event_type_round_trips_through_strings() {
        for et in [
            EventType::Loaded,
            EventType::Unloaded,
            EventType::Transfer,
            EventType::Checkin,
        ] {
            assert_eq!(EventType::parse(et.as_str()).unwrap(), et);
        }
    }

    #[test]
    fn unknown_event_type_rejected() {
        assert!(EventType::parse("DELIVERED").is_err());
        assert!(EventType::parse("loaded").is_err());
    }

    // -- First event --

    #[test]
    fn first_loaded_event_accepted() {
        let decision = validate_event(ts(0), &[], EventType::Loaded, ts(1), no_skew());
        assert_eq!(decision, ChainDecision::Accept);
    }

    #[test]
    fn first_non_loaded_event_flagged() {
        let decision = validate_event(ts(0), &[], EventType::Transfer, ts(1), no_skew());
        assert_matches!(&decision, ChainDecision::Flag { reason } if reason.contains("LOADED"));
    }

    // -- Registration boundary --

    #[test]
    fn event_before_registration_rejected() {
        let decision = validate_event(ts(5), &[], EventType::Loaded, ts(4), no_skew());
        assert_matches!(
            &decision,
            ChainDecision::Reject { reason } if reason.contains("registration")
        );
    }

    #[test]
    fn event_at_registration_instant_accepted() {
        let decision = validate_event(ts(5), &[], EventType::Loaded, ts(5), no_skew());
        assert_eq!(decision, ChainDecision::Accept);
    }

    #[test]
    fn rejection_wins_over_transition_check() {
        // Predating registration must reject even when the transition is
        // also wrong.
        let chain = [link(EventType::Loaded, 6)];
        let decision = validate_event(ts(5), &chain, EventType::Checkin, ts(4), no_skew());
        assert!(decision.is_reject());
    }

    // -- Temporal ordering --

    #[test]
    fn out_of_order_event_flagged_with_zero_tolerance() {
        let chain = [link(EventType::Loaded, 3)];
        let decision = validate_event(ts(0), &chain, EventType::Transfer, ts(2), no_skew());
        assert!(decision.is_flag());
        assert!(decision.reason().unwrap().contains("precedes"));
    }

    #[test]
    fn out_of_order_event_within_tolerance_accepted() {
        let chain = [link(EventType::Loaded, 3)];
        let decision = validate_event(
            ts(0),
            &chain,
            EventType::Transfer,
            ts(2),
            Duration::hours(2),
        );
        assert_eq!(decision, ChainDecision::Accept);
    }

    #[test]
    fn equal_timestamps_accepted() {
        let chain = [link(EventType::Loaded, 3)];
        let decision = validate_event(ts(0), &chain, EventType::Transfer, ts(3), no_skew());
        assert_eq!(decision, ChainDecision::Accept);
    }

    // -- Transitions --

    #[test]
    fn full_custody_leg_accepted() {
        let mut chain: Vec<ChainLink> = Vec::new();
        for (i, et) in [
            EventType::Loaded,
            EventType::Transfer,
            EventType::Unloaded,
            EventType::Checkin,
        ]
        .into_iter()
        .enumerate()
        {
            let t = ts(1 + i as u32);
            let decision = validate_event(ts(0), &chain, et, t, no_skew());
            assert_eq!(decision, ChainDecision::Accept, "step {i}");
            chain.push(ChainLink {
                event_type: et,
                timestamp: t,
            });
        }
    }

    #[test]
    fn transfer_is_re_enterable() {
        let chain = [link(EventType::Loaded, 1), link(EventType::Transfer, 2)];
        let decision = validate_event(ts(0), &chain, EventType::Transfer, ts(3), no_skew());
        assert_eq!(decision, ChainDecision::Accept);
    }

    #[test]
    fn new_leg_starts_after_checkin() {
        let chain = [
            link(EventType::Loaded, 1),
            link(EventType::Transfer, 2),
            link(EventType::Unloaded, 3),
            link(EventType::Checkin, 4),
        ];
        let decision = validate_event(ts(0), &chain, EventType::Loaded, ts(5), no_skew());
        assert_eq!(decision, ChainDecision::Accept);
    }

    #[test]
    fn unloaded_may_skip_checkin_into_next_leg() {
        let chain = [
            link(EventType::Loaded, 1),
            link(EventType::Transfer, 2),
            link(EventType::Unloaded, 3),
        ];
        let decision = validate_event(ts(0), &chain, EventType::Loaded, ts(4), no_skew());
        assert_eq!(decision, ChainDecision::Accept);
    }

    #[test]
    fn invalid_transition_flagged_not_rejected() {
        // LOADED -> CHECKIN skips the whole leg.
        let chain = [link(EventType::Loaded, 1)];
        let decision = validate_event(ts(0), &chain, EventType::Checkin, ts(2), no_skew());
        assert!(decision.is_flag());
        assert!(decision
            .reason()
            .unwrap()
            .contains("LOADED -> CHECKIN"));
    }

    #[test]
    fn checkin_after_checkin_flagged() {
        let chain = [
            link(EventType::Loaded, 1),
            link(EventType::Transfer, 2),
            link(EventType::Unloaded, 3),
            link(EventType::Checkin, 4),
        ];
        let decision = validate_event(ts(0), &chain, EventType::Checkin, ts(5), no_skew());
        assert!(decision.is_flag());
    }

    #[test]
    fn timestamp_flag_reported_before_transition_flag() {
        // Both violations present; the temporal one is reported.
        let chain = [link(EventType::Loaded, 3)];
        let decision = validate_event(ts(0), &chain, EventType::Checkin, ts(2), no_skew());
        assert!(decision.is_flag());
        assert!(decision.reason().unwrap().contains("precedes"));
    }
}
