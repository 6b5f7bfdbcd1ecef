//! Mixer - real-time voice summing for the output callback
//!
//! The mixer runs inside the audio callback and must stay real-time safe:
//! - No heap allocations while rendering (voice slots are pre-allocated)
//! - No locks or blocking; commands arrive through a lock-free SPSC queue
//! - Bounded execution time (sample sums and per-frame gain ramps)
//!
//! Two kinds of playback exist:
//! - One-shot voices (cues, the wake tone): play once at a fixed gain, then
//!   free their slot.
//! - A single looping voice (ambience): gain automated by linear per-frame
//!   ramps, released when a stopping ramp reaches zero. At most one looping
//!   voice is alive at any time; a second start is ignored while one exists.

use std::sync::Arc;

/// Maximum simultaneous one-shot voices. Cues are short and phase-paced, so
/// this is generous; excess commands are dropped rather than allocated for.
pub const MAX_VOICES: usize = 8;

/// Capacity of the control-to-callback command queue
pub const COMMAND_QUEUE_CAPACITY: usize = 64;

/// Commands delivered from the control thread to the audio callback.
#[derive(Debug, Clone)]
pub enum MixerCommand {
    /// Start a fresh one-shot voice at the given gain
    PlayVoice { samples: Arc<Vec<f32>>, gain: f32 },
    /// Start the looping voice at zero gain, ramping to `target_gain`
    /// over `fade_frames`. Ignored if a looping voice already exists.
    StartLoop {
        samples: Arc<Vec<f32>>,
        target_gain: f32,
        fade_frames: u64,
    },
    /// Cancel any pending ramp and ramp the looping voice's current gain
    /// down to zero over `fade_frames`, releasing the voice when it gets
    /// there. No-op if no looping voice exists.
    FadeOutLoop { fade_frames: u64 },
    /// Drop the looping voice immediately (fade-out cleanup backstop)
    StopLoop,
}

/// A one-shot playback voice
struct Voice {
    samples: Arc<Vec<f32>>,
    pos: usize,
    gain: f32,
}

/// Linear per-frame gain ramp
struct Ramp {
    target: f32,
    step: f32,
}

/// The looping ambience voice
struct LoopVoice {
    samples: Arc<Vec<f32>>,
    pos: usize,
    gain: f32,
    ramp: Option<Ramp>,
    stopping: bool,
}

/// Voice mixer owned by the audio callback.
pub struct Mixer {
    voices: Vec<Voice>,
    loop_voice: Option<LoopVoice>,
}

impl Mixer {
    pub fn new() -> Self {
        Self {
            voices: Vec::with_capacity(MAX_VOICES),
            loop_voice: None,
        }
    }

    /// Apply a control command. Called from the callback after draining the
    /// queue; never allocates beyond the pre-reserved voice slots.
    pub fn apply(&mut self, cmd: MixerCommand) {
        match cmd {
            MixerCommand::PlayVoice { samples, gain } => {
                if samples.is_empty() || self.voices.len() >= MAX_VOICES {
                    return;
                }
                self.voices.push(Voice {
                    samples,
                    pos: 0,
                    gain,
                });
            }
            MixerCommand::StartLoop {
                samples,
                target_gain,
                fade_frames,
            } => {
                // At-most-one looping voice: a second start is ignored.
                if samples.is_empty() || self.loop_voice.is_some() {
                    return;
                }
                self.loop_voice = Some(LoopVoice {
                    samples,
                    pos: 0,
                    gain: 0.0,
                    ramp: Some(make_ramp(0.0, target_gain, fade_frames)),
                    stopping: false,
                });
            }
            MixerCommand::FadeOutLoop { fade_frames } => {
                if let Some(lv) = self.loop_voice.as_mut() {
                    lv.ramp = Some(make_ramp(lv.gain, 0.0, fade_frames));
                    lv.stopping = true;
                }
            }
            MixerCommand::StopLoop => {
                self.loop_voice = None;
            }
        }
    }

    /// Render `data` (interleaved, `channels` per frame), mixing all active
    /// voices. Finished voices are released in place.
    pub fn render(&mut self, data: &mut [f32], channels: usize) {
        if channels == 0 {
            return;
        }
        let frame_count = data.len() / channels;
        let mut release_loop = false;

        for frame in 0..frame_count {
            let mut acc = 0.0_f32;

            for voice in self.voices.iter_mut() {
                if voice.pos < voice.samples.len() {
                    acc += voice.samples[voice.pos] * voice.gain;
                    voice.pos += 1;
                }
            }

            if let Some(lv) = self.loop_voice.as_mut() {
                if let Some(ramp) = lv.ramp.as_mut() {
                    lv.gain += ramp.step;
                    let reached = (ramp.step >= 0.0 && lv.gain >= ramp.target)
                        || (ramp.step < 0.0 && lv.gain <= ramp.target);
                    if reached {
                        lv.gain = ramp.target;
                        lv.ramp = None;
                    }
                }
                acc += lv.samples[lv.pos] * lv.gain;
                lv.pos = (lv.pos + 1) % lv.samples.len();
                if lv.stopping && lv.ramp.is_none() && lv.gain <= 0.0 {
                    release_loop = true;
                }
            }

            let value = acc.clamp(-1.0, 1.0);
            for ch in 0..channels {
                data[frame * channels + ch] = value;
            }
        }

        self.voices.retain(|v| v.pos < v.samples.len());
        if release_loop {
            self.loop_voice = None;
        }
    }

    /// Whether the looping voice is alive (any sub-state, including fading).
    pub fn loop_active(&self) -> bool {
        self.loop_voice.is_some()
    }

    /// Current looping-voice gain, for tests and diagnostics.
    pub fn loop_gain(&self) -> Option<f32> {
        self.loop_voice.as_ref().map(|lv| lv.gain)
    }

    /// Number of live one-shot voices.
    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new()
    }
}

fn make_ramp(from: f32, target: f32, fade_frames: u64) -> Ramp {
    if fade_frames == 0 {
        // Degenerate ramp: jump on the next rendered frame.
        return Ramp {
            target,
            step: target - from,
        };
    }
    Ramp {
        target,
        step: (target - from) / fade_frames as f32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(value: f32, len: usize) -> Arc<Vec<f32>> {
        Arc::new(vec![value; len])
    }

    fn render_frames(mixer: &mut Mixer, frames: usize, channels: usize) -> Vec<f32> {
        let mut data = vec![0.0_f32; frames * channels];
        mixer.render(&mut data, channels);
        data
    }

    #[test]
    fn test_one_shot_voice_plays_then_releases() {
        let mut mixer = Mixer::new();
        mixer.apply(MixerCommand::PlayVoice {
            samples: constant(0.25, 4),
            gain: 1.0,
        });
        assert_eq!(mixer.active_voices(), 1);

        let out = render_frames(&mut mixer, 8, 1);
        assert_eq!(&out[..4], &[0.25, 0.25, 0.25, 0.25]);
        assert_eq!(&out[4..], &[0.0, 0.0, 0.0, 0.0]);
        assert_eq!(mixer.active_voices(), 0);
    }

    #[test]
    fn test_voice_gain_is_applied() {
        let mut mixer = Mixer::new();
        mixer.apply(MixerCommand::PlayVoice {
            samples: constant(0.5, 2),
            gain: 0.5,
        });
        let out = render_frames(&mut mixer, 2, 1);
        assert_eq!(out, vec![0.25, 0.25]);
    }

    #[test]
    fn test_voices_sum_and_clamp() {
        let mut mixer = Mixer::new();
        for _ in 0..2 {
            mixer.apply(MixerCommand::PlayVoice {
                samples: constant(0.8, 2),
                gain: 1.0,
            });
        }
        let out = render_frames(&mut mixer, 2, 1);
        // 0.8 + 0.8 clamps to 1.0
        assert_eq!(out, vec![1.0, 1.0]);
    }

    #[test]
    fn test_interleaved_channels_get_same_value() {
        let mut mixer = Mixer::new();
        mixer.apply(MixerCommand::PlayVoice {
            samples: constant(0.3, 1),
            gain: 1.0,
        });
        let out = render_frames(&mut mixer, 1, 2);
        assert_eq!(out, vec![0.3, 0.3]);
    }

    #[test]
    fn test_voice_cap_drops_excess() {
        let mut mixer = Mixer::new();
        for _ in 0..(MAX_VOICES + 3) {
            mixer.apply(MixerCommand::PlayVoice {
                samples: constant(0.1, 16),
                gain: 1.0,
            });
        }
        assert_eq!(mixer.active_voices(), MAX_VOICES);
    }

    #[test]
    fn test_empty_buffer_ignored() {
        let mut mixer = Mixer::new();
        mixer.apply(MixerCommand::PlayVoice {
            samples: constant(0.0, 0),
            gain: 1.0,
        });
        mixer.apply(MixerCommand::StartLoop {
            samples: constant(0.0, 0),
            target_gain: 0.5,
            fade_frames: 10,
        });
        assert_eq!(mixer.active_voices(), 0);
        assert!(!mixer.loop_active());
    }

    #[test]
    fn test_loop_fades_in_to_target() {
        let mut mixer = Mixer::new();
        mixer.apply(MixerCommand::StartLoop {
            samples: constant(1.0, 4),
            target_gain: 0.5,
            fade_frames: 10,
        });
        render_frames(&mut mixer, 10, 1);
        let gain = mixer.loop_gain().unwrap();
        assert!((gain - 0.5).abs() < 1e-4, "gain {} should reach 0.5", gain);

        // Gain stays at the target once reached.
        render_frames(&mut mixer, 20, 1);
        assert!((mixer.loop_gain().unwrap() - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_loop_wraps_around_buffer() {
        let mut mixer = Mixer::new();
        mixer.apply(MixerCommand::StartLoop {
            samples: Arc::new(vec![0.5, -0.5]),
            target_gain: 1.0,
            fade_frames: 0,
        });
        let out = render_frames(&mut mixer, 6, 1);
        assert_eq!(out, vec![0.5, -0.5, 0.5, -0.5, 0.5, -0.5]);
        assert!(mixer.loop_active());
    }

    #[test]
    fn test_second_loop_start_ignored() {
        let mut mixer = Mixer::new();
        mixer.apply(MixerCommand::StartLoop {
            samples: constant(0.2, 4),
            target_gain: 0.5,
            fade_frames: 0,
        });
        mixer.apply(MixerCommand::StartLoop {
            samples: constant(0.9, 4),
            target_gain: 1.0,
            fade_frames: 0,
        });
        let out = render_frames(&mut mixer, 1, 1);
        // Still the first loop's samples: one voice, not two.
        assert_eq!(out, vec![0.2]);
    }

    #[test]
    fn test_fade_out_releases_loop() {
        let mut mixer = Mixer::new();
        mixer.apply(MixerCommand::StartLoop {
            samples: constant(1.0, 4),
            target_gain: 0.5,
            fade_frames: 0,
        });
        render_frames(&mut mixer, 4, 1);
        assert!(mixer.loop_active());

        mixer.apply(MixerCommand::FadeOutLoop { fade_frames: 8 });
        render_frames(&mut mixer, 8, 1);
        assert!(!mixer.loop_active(), "loop should release at zero gain");
    }

    #[test]
    fn test_fade_out_cancels_pending_fade_in() {
        let mut mixer = Mixer::new();
        mixer.apply(MixerCommand::StartLoop {
            samples: constant(1.0, 4),
            target_gain: 0.5,
            fade_frames: 1000,
        });
        // Part-way through the fade-in, reverse direction.
        render_frames(&mut mixer, 100, 1);
        let mid_gain = mixer.loop_gain().unwrap();
        assert!(mid_gain > 0.0 && mid_gain < 0.5);

        mixer.apply(MixerCommand::FadeOutLoop { fade_frames: 50 });
        render_frames(&mut mixer, 50, 1);
        assert!(!mixer.loop_active());
    }

    #[test]
    fn test_stop_loop_is_immediate() {
        let mut mixer = Mixer::new();
        mixer.apply(MixerCommand::StartLoop {
            samples: constant(1.0, 4),
            target_gain: 0.5,
            fade_frames: 0,
        });
        mixer.apply(MixerCommand::StopLoop);
        assert!(!mixer.loop_active());
        let out = render_frames(&mut mixer, 2, 1);
        assert_eq!(out, vec![0.0, 0.0]);
    }

    #[test]
    fn test_fade_out_without_loop_is_noop() {
        let mut mixer = Mixer::new();
        mixer.apply(MixerCommand::FadeOutLoop { fade_frames: 10 });
        assert!(!mixer.loop_active());
    }
}
