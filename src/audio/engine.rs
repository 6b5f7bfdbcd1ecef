//! AudioEngine - unlock gating, one-shot cues, ambience fade control
//!
//! The engine is an owned, lifecycle-scoped handle over the output backend:
//! no ambient globals, an explicit `dispose()`, and all mutation of the
//! output graph funneled through its operations.
//!
//! Playback is gesture-gated: nothing is audible until `resume()` has been
//! called (the host must do so synchronously inside a user action). Cue
//! playback when locked or when an asset is absent is a silent no-op,
//! never an error.
//!
//! The background ambience is modeled as an explicit sub-state machine
//! (`Silent | FadingIn | Playing | FadingOut`) so re-entrant fade-in
//! requests during a fade-out resolve by state transition instead of racing
//! deferred callbacks. At most one ambience voice is alive at any time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

use crate::audio::assets::{spawn_asset_loads, AssetStore};
use crate::audio::backend::AudioBackend;
use crate::audio::cue::{CueKind, SoundAsset};
use crate::audio::mixer::MixerCommand;
use crate::audio::tone::generate_wake_tone;
use crate::config::{AppSettings, AssetPaths};
use crate::error::{log_audio_error, AudioError};
use crate::timing::{frames_for_secs, secs_to_duration};

/// Target gain of the ambience loop once faded in
pub const AMBIENCE_GAIN: f32 = 0.5;
/// Ambience fade-in length in seconds
pub const AMBIENCE_FADE_IN_SECS: f32 = 2.0;
/// Ambience fade-out length in seconds
pub const AMBIENCE_FADE_OUT_SECS: f32 = 1.0;
/// Deferred force-stop after a fade-out begins (ramp length + margin)
pub const AMBIENCE_CLEANUP_SECS: f32 = 1.1;

/// Ambience control sub-states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmbienceState {
    Silent,
    FadingIn,
    Playing,
    FadingOut,
}

struct AmbienceControl {
    state: AmbienceState,
    /// Bumped on every state change; scheduled follow-ups carry the epoch
    /// they were scheduled under and do nothing when it has moved on.
    epoch: u64,
}

/// Audio engine: owns the backend handle, the asset registry, and the
/// ambience control state.
pub struct AudioEngine {
    backend: Arc<dyn AudioBackend>,
    assets: Arc<AssetStore>,
    settings: Arc<RwLock<AppSettings>>,
    ambience: Mutex<AmbienceControl>,
    session_running: AtomicBool,
    wake_tone: Arc<Vec<f32>>,
    /// Self-handle for the fade follow-up tasks the engine spawns.
    weak: Weak<AudioEngine>,
}

impl AudioEngine {
    /// Create the engine and start loading the five assets concurrently.
    ///
    /// Must be called from within a tokio runtime (asset loads run on
    /// blocking tasks). The engine starts locked; call [`resume`] from a
    /// user action before the first session.
    ///
    /// [`resume`]: AudioEngine::resume
    pub fn new(
        backend: Arc<dyn AudioBackend>,
        settings: Arc<RwLock<AppSettings>>,
        asset_paths: AssetPaths,
    ) -> Arc<Self> {
        let assets = Arc::new(AssetStore::new());
        spawn_asset_loads(Arc::clone(&assets), asset_paths);
        let wake_tone = Arc::new(generate_wake_tone(backend.sample_rate()));

        Arc::new_cyclic(|weak| Self {
            backend,
            assets,
            settings,
            ambience: Mutex::new(AmbienceControl {
                state: AmbienceState::Silent,
                epoch: 0,
            }),
            session_running: AtomicBool::new(false),
            wake_tone,
            weak: weak.clone(),
        })
    }

    /// Shared handle to the asset registry (loader writes, tests preload).
    pub fn asset_store(&self) -> Arc<AssetStore> {
        Arc::clone(&self.assets)
    }

    /// Unlock the output graph. Idempotent.
    ///
    /// Must be invoked synchronously within a user-initiated action before
    /// the first session so platform audio policy attributes the output to
    /// a gesture. Every call emits the near-silent wake tone; some mobile
    /// hardware keeps the channel asleep even after the graph resumes.
    pub fn resume(&self) -> Result<(), AudioError> {
        if !self.backend.is_active() {
            self.backend.activate()?;
            log::info!("[Audio] Output unlocked");
        }
        self.submit(MixerCommand::PlayVoice {
            samples: Arc::clone(&self.wake_tone),
            gain: 1.0,
        });
        Ok(())
    }

    /// Whether the output graph has been unlocked.
    pub fn is_unlocked(&self) -> bool {
        self.backend.is_active()
    }

    /// Play a one-shot cue at full gain.
    ///
    /// Silent no-op when the output is locked or the asset is absent. When
    /// voice cues are disabled, everything but the finish chime is
    /// suppressed; the finish chime always plays to mark session
    /// completion.
    pub fn play_cue(&self, cue: CueKind) {
        if !self.backend.is_active() {
            log::debug!("[Audio] Skipping cue {:?}: output not unlocked", cue);
            return;
        }

        let voice_enabled = self
            .settings
            .read()
            .map(|s| s.voice_enabled)
            .unwrap_or(true);
        if !voice_enabled && cue != CueKind::Finish {
            return;
        }

        match self.assets.get(cue.asset()) {
            Some(samples) => {
                self.submit(MixerCommand::PlayVoice { samples, gain: 1.0 });
            }
            None => {
                log::debug!("[Audio] Skipping cue {:?}: asset not loaded", cue);
            }
        }
    }

    /// Record the session running state and re-evaluate the ambience loop.
    pub fn set_session_running(&self, running: bool) {
        self.session_running.store(running, Ordering::SeqCst);
        self.sync_ambience();
    }

    /// Current ambience sub-state (diagnostics and tests).
    pub fn ambience_state(&self) -> AmbienceState {
        self.ambience
            .lock()
            .map(|c| c.state)
            .unwrap_or(AmbienceState::Silent)
    }

    /// Re-evaluate the ambience loop against (running, enabled, loaded).
    ///
    /// Called whenever the session running state or the settings change.
    /// Transitions are atomic under the control lock; follow-up work
    /// (promotion to `Playing`, the deferred force-stop) is epoch-guarded
    /// so superseded schedules never fire.
    pub fn sync_ambience(&self) {
        let wanted = self.ambience_wanted();

        let Ok(mut control) = self.ambience.lock() else {
            log::warn!("[Audio] Ambience control lock poisoned");
            return;
        };

        match control.state {
            AmbienceState::Silent => {
                if !wanted || !self.backend.is_active() {
                    return;
                }
                let Some(samples) = self.assets.get(SoundAsset::Ambience) else {
                    log::debug!("[Audio] Ambience asset not loaded; staying silent");
                    return;
                };
                self.submit(MixerCommand::StartLoop {
                    samples,
                    target_gain: AMBIENCE_GAIN,
                    fade_frames: frames_for_secs(AMBIENCE_FADE_IN_SECS, self.backend.sample_rate()),
                });
                control.state = AmbienceState::FadingIn;
                control.epoch += 1;
                self.schedule_promotion(control.epoch);
            }
            AmbienceState::FadingIn | AmbienceState::Playing => {
                if wanted {
                    return;
                }
                self.submit(MixerCommand::FadeOutLoop {
                    fade_frames: frames_for_secs(
                        AMBIENCE_FADE_OUT_SECS,
                        self.backend.sample_rate(),
                    ),
                });
                control.state = AmbienceState::FadingOut;
                control.epoch += 1;
                self.schedule_cleanup(control.epoch);
            }
            AmbienceState::FadingOut => {
                // A new instance cannot start while the fade-out is pending;
                // the cleanup task re-evaluates once the voice is released.
            }
        }
    }

    /// Close the output graph, releasing the device.
    ///
    /// Pending fades are cut short; acceptable since the engine is ending.
    pub fn dispose(&self) {
        if let Err(err) = self.backend.close() {
            log_audio_error(&err, "dispose");
        }
    }

    fn ambience_wanted(&self) -> bool {
        let enabled = self
            .settings
            .read()
            .map(|s| s.ambience_enabled)
            .unwrap_or(false);
        self.session_running.load(Ordering::SeqCst) && enabled
    }

    fn submit(&self, cmd: MixerCommand) {
        if let Err(err) = self.backend.submit(cmd) {
            log_audio_error(&err, "submit");
        }
    }

    /// After the fade-in completes, mark the loop as fully playing.
    fn schedule_promotion(&self, epoch: u64) {
        let Some(engine) = self.weak.upgrade() else {
            return;
        };
        tokio::spawn(async move {
            tokio::time::sleep(secs_to_duration(AMBIENCE_FADE_IN_SECS)).await;
            if let Ok(mut control) = engine.ambience.lock() {
                if control.epoch == epoch && control.state == AmbienceState::FadingIn {
                    control.state = AmbienceState::Playing;
                }
            }
        });
    }

    /// Force-stop the loop shortly after its fade-out ramp finishes, then
    /// re-evaluate so a fade-in requested mid-fade can start cleanly.
    fn schedule_cleanup(&self, epoch: u64) {
        let Some(engine) = self.weak.upgrade() else {
            return;
        };
        tokio::spawn(async move {
            tokio::time::sleep(secs_to_duration(AMBIENCE_CLEANUP_SECS)).await;
            {
                let Ok(mut control) = engine.ambience.lock() else {
                    return;
                };
                if control.epoch != epoch || control.state != AmbienceState::FadingOut {
                    return;
                }
                engine.submit(MixerCommand::StopLoop);
                control.state = AmbienceState::Silent;
                control.epoch += 1;
            }
            engine.sync_ambience();
        });
    }
}
