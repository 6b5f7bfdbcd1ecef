//! Phase - the breathing cycle's closed state set and transition table
//!
//! This module provides the deterministic phase-transition rules as pure
//! functions. Key properties:
//! - `Phase` is a closed enumeration; no other states exist
//! - A hold phase appears in the cycle iff its duration is > 0 (a zero hold
//!   is skipped entirely, never entered with zero duration)
//! - `Finished` is terminal; it is only reached by the session countdown
//! - Pure functions, no side effects, exhaustively testable

use crate::patterns::BreathPattern;

/// One step of the breathing cycle, or a control state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Initial and paused state; nothing scheduled
    Idle,
    Inhale,
    HoldIn,
    Exhale,
    HoldOut,
    /// Terminal state, reached only via session countdown expiry
    Finished,
}

impl Phase {
    /// Whether this is one of the four active breathing phases.
    pub fn is_breathing(self) -> bool {
        matches!(
            self,
            Phase::Inhale | Phase::HoldIn | Phase::Exhale | Phase::HoldOut
        )
    }

    /// Display name for UI layers and logs.
    pub fn label(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Inhale => "inhale",
            Phase::HoldIn => "hold-in",
            Phase::Exhale => "exhale",
            Phase::HoldOut => "hold-out",
            Phase::Finished => "finished",
        }
    }
}

/// How long the given phase runs under this pattern, in seconds.
///
/// Control states (`Idle`, `Finished`) have no duration.
#[inline]
pub fn phase_duration(pattern: &BreathPattern, phase: Phase) -> f32 {
    match phase {
        Phase::Inhale => pattern.inhale,
        Phase::HoldIn => pattern.hold_in,
        Phase::Exhale => pattern.exhale,
        Phase::HoldOut => pattern.hold_out,
        Phase::Idle | Phase::Finished => 0.0,
    }
}

/// The phase that follows `current` under this pattern.
///
/// Transition table (holds appear iff their duration > 0):
/// `idle -> inhale -> [hold-in] -> exhale -> [hold-out] -> inhale -> ...`
/// `Finished` is terminal and yields `None`.
#[inline]
pub fn next_phase(pattern: &BreathPattern, current: Phase) -> Option<Phase> {
    match current {
        Phase::Idle => Some(Phase::Inhale),
        Phase::Inhale => Some(if pattern.hold_in > 0.0 {
            Phase::HoldIn
        } else {
            Phase::Exhale
        }),
        Phase::HoldIn => Some(Phase::Exhale),
        Phase::Exhale => Some(if pattern.hold_out > 0.0 {
            Phase::HoldOut
        } else {
            Phase::Inhale
        }),
        Phase::HoldOut => Some(Phase::Inhale),
        Phase::Finished => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::{default_pattern, find_pattern};

    #[test]
    fn test_box_pattern_full_cycle() {
        let pattern = default_pattern(); // 4/4/4/4
        assert_eq!(next_phase(&pattern, Phase::Idle), Some(Phase::Inhale));
        assert_eq!(next_phase(&pattern, Phase::Inhale), Some(Phase::HoldIn));
        assert_eq!(next_phase(&pattern, Phase::HoldIn), Some(Phase::Exhale));
        assert_eq!(next_phase(&pattern, Phase::Exhale), Some(Phase::HoldOut));
        assert_eq!(next_phase(&pattern, Phase::HoldOut), Some(Phase::Inhale));
    }

    #[test]
    fn test_zero_holds_are_skipped() {
        let pattern = find_pattern("balance").unwrap(); // 5/0/5/0
        assert_eq!(next_phase(&pattern, Phase::Inhale), Some(Phase::Exhale));
        assert_eq!(next_phase(&pattern, Phase::Exhale), Some(Phase::Inhale));
    }

    #[test]
    fn test_single_hold_patterns() {
        let pattern = find_pattern("sleep").unwrap(); // 4/7/8/0
        assert_eq!(next_phase(&pattern, Phase::Inhale), Some(Phase::HoldIn));
        assert_eq!(next_phase(&pattern, Phase::Exhale), Some(Phase::Inhale));
    }

    #[test]
    fn test_finished_is_terminal() {
        let pattern = default_pattern();
        assert_eq!(next_phase(&pattern, Phase::Finished), None);
    }

    #[test]
    fn test_phase_durations() {
        let pattern = find_pattern("sleep").unwrap();
        assert_eq!(phase_duration(&pattern, Phase::Inhale), 4.0);
        assert_eq!(phase_duration(&pattern, Phase::HoldIn), 7.0);
        assert_eq!(phase_duration(&pattern, Phase::Exhale), 8.0);
        assert_eq!(phase_duration(&pattern, Phase::HoldOut), 0.0);
        assert_eq!(phase_duration(&pattern, Phase::Idle), 0.0);
        assert_eq!(phase_duration(&pattern, Phase::Finished), 0.0);
    }

    #[test]
    fn test_is_breathing() {
        assert!(Phase::Inhale.is_breathing());
        assert!(Phase::HoldIn.is_breathing());
        assert!(Phase::Exhale.is_breathing());
        assert!(Phase::HoldOut.is_breathing());
        assert!(!Phase::Idle.is_breathing());
        assert!(!Phase::Finished.is_breathing());
    }

    #[test]
    fn test_labels() {
        assert_eq!(Phase::HoldIn.label(), "hold-in");
        assert_eq!(Phase::HoldOut.label(), "hold-out");
        assert_eq!(Phase::Finished.label(), "finished");
    }
}
