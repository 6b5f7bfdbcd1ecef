//! Shared timing conversions
//!
//! Phase durations are fractional seconds (patterns like resonance breathing
//! use 5.5 s phases), while the scheduler wants `Duration` and the mixer
//! wants frame counts. These helpers keep the conversions in one place.
//! All functions are pure and clamp negative inputs to zero.

use std::time::Duration;

/// Convert fractional seconds to a `Duration`, clamping negatives to zero.
///
/// # Examples
/// ```
/// use breath_coach::timing::secs_to_duration;
/// assert_eq!(secs_to_duration(5.5).as_millis(), 5500);
/// assert_eq!(secs_to_duration(-1.0).as_millis(), 0);
/// ```
#[inline]
pub fn secs_to_duration(secs: f32) -> Duration {
    Duration::from_secs_f32(secs.max(0.0))
}

/// Convert fractional seconds to a frame count at the given sample rate.
///
/// Used for gain-ramp lengths in the mixer. Rounds to the nearest frame.
///
/// # Examples
/// ```
/// use breath_coach::timing::frames_for_secs;
/// assert_eq!(frames_for_secs(2.0, 48000), 96000);
/// ```
#[inline]
pub fn frames_for_secs(secs: f32, sample_rate: u32) -> u64 {
    (secs.max(0.0) as f64 * sample_rate as f64).round() as u64
}

/// Total session length in seconds for a configured number of minutes.
#[inline]
pub fn session_seconds(minutes: u32) -> u32 {
    minutes * 60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secs_to_duration_fractional() {
        assert_eq!(secs_to_duration(0.5).as_millis(), 500);
        assert_eq!(secs_to_duration(5.5).as_millis(), 5500);
        assert_eq!(secs_to_duration(0.0), Duration::ZERO);
    }

    #[test]
    fn test_secs_to_duration_clamps_negative() {
        assert_eq!(secs_to_duration(-3.0), Duration::ZERO);
    }

    #[test]
    fn test_frames_for_secs() {
        assert_eq!(frames_for_secs(1.0, 48000), 48000);
        assert_eq!(frames_for_secs(2.0, 48000), 96000);
        assert_eq!(frames_for_secs(0.1, 48000), 4800);
        assert_eq!(frames_for_secs(1.0, 44100), 44100);
        assert_eq!(frames_for_secs(-1.0, 48000), 0);
    }

    #[test]
    fn test_session_seconds() {
        assert_eq!(session_seconds(1), 60);
        assert_eq!(session_seconds(5), 300);
        assert_eq!(session_seconds(180), 10800);
    }
}
