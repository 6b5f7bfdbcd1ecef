//! Wake tone - near-silent hardware warm-up sample
//!
//! Restrictive mobile platforms sometimes leave the hardware audio channel
//! asleep even after the output graph is resumed. Playing a very short,
//! near-inaudible tone right after unlock forces the channel awake. The
//! tone is a 100 ms sine at 440 Hz scaled to amplitude 0.001.

/// Duration of the wake tone in milliseconds
const WAKE_TONE_DURATION_MS: f32 = 100.0;

/// Peak amplitude of the wake tone (near-silent)
const WAKE_TONE_AMPLITUDE: f32 = 0.001;

/// Frequency of the wake tone in Hz
const WAKE_TONE_FREQ_HZ: f32 = 440.0;

/// Generate the wake-tone sample buffer.
///
/// Deterministic output: the same sample rate always produces identical
/// samples, so the buffer can be generated once and shared.
///
/// # Arguments
/// * `sample_rate` - Sample rate in Hz (typically 48000)
///
/// # Returns
/// A `Vec<f32>` containing exactly 100 ms of sine samples, peak ±0.001
pub fn generate_wake_tone(sample_rate: u32) -> Vec<f32> {
    let num_samples = (sample_rate as f32 * WAKE_TONE_DURATION_MS / 1000.0) as usize;
    let step = 2.0 * std::f32::consts::PI * WAKE_TONE_FREQ_HZ / sample_rate as f32;

    let mut samples = Vec::with_capacity(num_samples);
    for i in 0..num_samples {
        samples.push(WAKE_TONE_AMPLITUDE * (step * i as f32).sin());
    }

    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wake_tone_duration() {
        for &sr in &[44100u32, 48000, 96000] {
            let tone = generate_wake_tone(sr);
            let expected = (sr as f32 * WAKE_TONE_DURATION_MS / 1000.0) as usize;
            assert_eq!(tone.len(), expected, "tone should be 100ms at {} Hz", sr);
        }
    }

    #[test]
    fn test_wake_tone_is_near_silent() {
        let tone = generate_wake_tone(48000);
        for (i, &sample) in tone.iter().enumerate() {
            assert!(
                sample.abs() <= WAKE_TONE_AMPLITUDE + f32::EPSILON,
                "sample {} at index {} exceeds the near-silent amplitude",
                sample,
                i
            );
        }
        // It must still carry signal, not pure silence.
        assert!(tone.iter().any(|&s| s.abs() > WAKE_TONE_AMPLITUDE * 0.5));
    }

    #[test]
    fn test_wake_tone_deterministic() {
        assert_eq!(generate_wake_tone(48000), generate_wake_tone(48000));
    }
}
