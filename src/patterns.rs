//! Breathing pattern catalog
//!
//! A pattern is four phase durations (seconds, fractional allowed) plus
//! display metadata. Built-in patterns match the product catalog; users can
//! also build a custom pattern, which goes through the same validation.
//!
//! Invariant: `inhale > 0` and `exhale > 0`. A hold duration of exactly 0
//! means that hold phase is skipped entirely, never entered with zero
//! duration.

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// A named breathing pattern: four phase durations plus display metadata.
///
/// Durations are seconds; holds may be zero (skipped). Immutable once
/// selected for a running cycle - the controller clones it on selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreathPattern {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Inhale duration in seconds (must be > 0)
    pub inhale: f32,
    /// Hold-after-inhale duration in seconds (0 = skipped)
    pub hold_in: f32,
    /// Exhale duration in seconds (must be > 0)
    pub exhale: f32,
    /// Hold-after-exhale duration in seconds (0 = skipped)
    pub hold_out: f32,
    /// Accent color (hex) for the visual layer
    pub color: String,
    /// Text color (hex) for the visual layer
    pub text_color: String,
}

impl BreathPattern {
    /// Build a user-defined pattern, enforcing the positive-duration invariant.
    pub fn custom(
        name: &str,
        inhale: f32,
        hold_in: f32,
        exhale: f32,
        hold_out: f32,
    ) -> Result<Self, SessionError> {
        let pattern = Self {
            id: "custom".to_string(),
            name: name.to_string(),
            description: "User-defined rhythm".to_string(),
            inhale,
            hold_in,
            exhale,
            hold_out,
            color: "#334155".to_string(),
            text_color: "#f1f5f9".to_string(),
        };
        pattern.validate()?;
        Ok(pattern)
    }

    /// Check the positive-duration invariant.
    ///
    /// A pattern with no active breathing phase (zero inhale or exhale) is
    /// invalid; negative durations are rejected for the holds as well.
    pub fn validate(&self) -> Result<(), SessionError> {
        if !(self.inhale > 0.0) {
            return Err(SessionError::InvalidPattern {
                id: self.id.clone(),
                reason: format!("inhale must be greater than 0 (got {})", self.inhale),
            });
        }
        if !(self.exhale > 0.0) {
            return Err(SessionError::InvalidPattern {
                id: self.id.clone(),
                reason: format!("exhale must be greater than 0 (got {})", self.exhale),
            });
        }
        if self.hold_in < 0.0 || self.hold_out < 0.0 {
            return Err(SessionError::InvalidPattern {
                id: self.id.clone(),
                reason: "hold durations must not be negative".to_string(),
            });
        }
        Ok(())
    }

    /// Seconds for one full cycle (inhale + holds + exhale).
    pub fn cycle_seconds(&self) -> f32 {
        self.inhale + self.hold_in + self.exhale + self.hold_out
    }
}

/// The built-in pattern catalog.
///
/// Read-only data; the controller never mutates a pattern.
pub fn builtin_patterns() -> Vec<BreathPattern> {
    #[allow(clippy::too_many_arguments)]
    fn entry(
        id: &str,
        name: &str,
        description: &str,
        inhale: f32,
        hold_in: f32,
        exhale: f32,
        hold_out: f32,
        color: &str,
        text_color: &str,
    ) -> BreathPattern {
        BreathPattern {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            inhale,
            hold_in,
            exhale,
            hold_out,
            color: color.to_string(),
            text_color: text_color.to_string(),
        }
    }

    vec![
        entry(
            "sleep",
            "4-7-8 Sleep",
            "Wind down into deep sleep",
            4.0,
            7.0,
            8.0,
            0.0,
            "#1e3a8a",
            "#bfdbfe",
        ),
        entry(
            "focus",
            "Box Breathing",
            "Sharpen focus and performance",
            4.0,
            4.0,
            4.0,
            4.0,
            "#0ea5e9",
            "#e0f2fe",
        ),
        entry(
            "balance",
            "Balanced Breathing",
            "Settle into an even rhythm",
            5.0,
            0.0,
            5.0,
            0.0,
            "#059669",
            "#d1fae5",
        ),
        entry(
            "calm",
            "Calming Breath",
            "Release tension and anxiety",
            4.0,
            0.0,
            6.0,
            0.0,
            "#7c3aed",
            "#ede9fe",
        ),
        entry(
            "energy",
            "Quick Recharge",
            "Wake up body and mind",
            4.0,
            0.0,
            2.0,
            0.0,
            "#ea580c",
            "#ffedd5",
        ),
        entry(
            "rest",
            "Deep Rest",
            "Reset the nervous system",
            4.0,
            2.0,
            6.0,
            2.0,
            "#4338ca",
            "#e0e7ff",
        ),
        entry(
            "capacity",
            "Capacity Builder",
            "Stretch your breathing limits",
            5.0,
            10.0,
            10.0,
            0.0,
            "#475569",
            "#f1f5f9",
        ),
        entry(
            "resonance",
            "Resonance Breathing",
            "Raise heart-rate variability (6 bpm)",
            5.5,
            0.0,
            5.5,
            0.0,
            "#0d9488",
            "#ccfbf1",
        ),
    ]
}

/// The pattern a fresh session starts with (box breathing).
pub fn default_pattern() -> BreathPattern {
    builtin_patterns()
        .into_iter()
        .find(|p| p.id == "focus")
        .unwrap_or_else(|| BreathPattern {
            id: "focus".to_string(),
            name: "Box Breathing".to_string(),
            description: "Sharpen focus and performance".to_string(),
            inhale: 4.0,
            hold_in: 4.0,
            exhale: 4.0,
            hold_out: 4.0,
            color: "#0ea5e9".to_string(),
            text_color: "#e0f2fe".to_string(),
        })
}

/// Look up a built-in pattern by its identifier.
pub fn find_pattern(id: &str) -> Option<BreathPattern> {
    builtin_patterns().into_iter().find(|p| p.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_patterns_all_valid() {
        for pattern in builtin_patterns() {
            assert!(
                pattern.validate().is_ok(),
                "built-in pattern '{}' must satisfy the positive-duration invariant",
                pattern.id
            );
        }
    }

    #[test]
    fn test_default_pattern_is_box() {
        let p = default_pattern();
        assert_eq!(p.id, "focus");
        assert_eq!(p.inhale, 4.0);
        assert_eq!(p.hold_in, 4.0);
        assert_eq!(p.exhale, 4.0);
        assert_eq!(p.hold_out, 4.0);
    }

    #[test]
    fn test_find_pattern() {
        assert!(find_pattern("sleep").is_some());
        assert!(find_pattern("resonance").is_some());
        assert!(find_pattern("nonexistent").is_none());
    }

    #[test]
    fn test_custom_pattern_valid() {
        let p = BreathPattern::custom("My Rhythm", 3.0, 1.0, 5.0, 0.0).unwrap();
        assert_eq!(p.id, "custom");
        assert_eq!(p.cycle_seconds(), 9.0);
    }

    #[test]
    fn test_zero_inhale_rejected() {
        let err = BreathPattern::custom("bad", 0.0, 0.0, 5.0, 0.0).unwrap_err();
        assert!(matches!(err, SessionError::InvalidPattern { .. }));
        assert!(err.to_string().contains("inhale"));
    }

    #[test]
    fn test_zero_exhale_rejected() {
        let err = BreathPattern::custom("bad", 4.0, 0.0, 0.0, 0.0).unwrap_err();
        assert!(matches!(err, SessionError::InvalidPattern { .. }));
    }

    #[test]
    fn test_negative_hold_rejected() {
        let err = BreathPattern::custom("bad", 4.0, -1.0, 4.0, 0.0).unwrap_err();
        assert!(matches!(err, SessionError::InvalidPattern { .. }));
    }

    #[test]
    fn test_fractional_durations_allowed() {
        let p = find_pattern("resonance").unwrap();
        assert_eq!(p.inhale, 5.5);
        assert!(p.validate().is_ok());
    }
}
