//! AppContext: session orchestration layer
//!
//! Thin glue between the user-facing operations, the phase controller, and
//! the audio engine. The controller never touches audio directly; its
//! observer callbacks are forwarded here, which keeps the phase-cue mapping
//! and the running/ambience coupling in one place.

use std::sync::{Arc, RwLock};

use crate::audio::{AudioBackend, AudioEngine, CueKind};
use crate::config::{AppConfig, AppSettings};
use crate::error::{log_audio_error, SessionError};
use crate::patterns::{builtin_patterns, find_pattern, BreathPattern};
use crate::session::{
    Phase, PhaseController, SessionEvent, SessionObserver, SessionSnapshot,
};

/// The cue played on entering a phase. `Idle` plays nothing.
fn cue_for_phase(phase: Phase) -> Option<CueKind> {
    match phase {
        Phase::Inhale => Some(CueKind::Inhale),
        Phase::Exhale => Some(CueKind::Exhale),
        Phase::HoldIn | Phase::HoldOut => Some(CueKind::Hold),
        Phase::Finished => Some(CueKind::Finish),
        Phase::Idle => None,
    }
}

/// Forwards controller callbacks into the audio engine.
struct EngineForwarder {
    engine: Arc<AudioEngine>,
}

impl SessionObserver for EngineForwarder {
    fn phase_entered(&self, phase: Phase) {
        if let Some(cue) = cue_for_phase(phase) {
            self.engine.play_cue(cue);
        }
    }

    fn running_changed(&self, running: bool) {
        self.engine.set_session_running(running);
    }
}

/// Application context wiring settings, audio engine, and phase controller.
pub struct AppContext {
    settings: Arc<RwLock<AppSettings>>,
    engine: Arc<AudioEngine>,
    controller: PhaseController,
}

impl AppContext {
    /// Build the context over the given output backend.
    ///
    /// Must be called from within a tokio runtime; asset loading starts
    /// immediately in the background.
    pub fn new(config: AppConfig, backend: Arc<dyn AudioBackend>) -> Self {
        let settings = Arc::new(RwLock::new(config.settings.normalized()));
        let engine = AudioEngine::new(backend, Arc::clone(&settings), config.assets);
        let forwarder = Arc::new(EngineForwarder {
            engine: Arc::clone(&engine),
        });
        let controller = PhaseController::new(
            Arc::clone(&settings),
            forwarder as Arc<dyn SessionObserver>,
        );

        Self {
            settings,
            engine,
            controller,
        }
    }

    /// The audio engine handle (for unlock calls and diagnostics).
    pub fn engine(&self) -> Arc<AudioEngine> {
        Arc::clone(&self.engine)
    }

    /// Subscribe to session events for display.
    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<SessionEvent> {
        self.controller.subscribe()
    }

    /// Current session state for display.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.controller.snapshot()
    }

    /// Current settings values.
    pub fn settings(&self) -> AppSettings {
        self.settings
            .read()
            .map(|s| *s)
            .unwrap_or_default()
    }

    /// The built-in pattern catalog.
    pub fn patterns(&self) -> Vec<BreathPattern> {
        builtin_patterns()
    }

    /// Unlock audio output. Must run synchronously inside a user action.
    pub fn unlock_audio(&self) {
        if let Err(err) = self.engine.resume() {
            // Degrades to a silent session; the timing cycle still runs.
            log_audio_error(&err, "unlock_audio");
        }
    }

    /// The play/pause affordance: unlocks audio (it is a user action),
    /// restarts after a finished session, otherwise toggles running.
    pub fn toggle_play(&self) {
        self.unlock_audio();

        let snapshot = self.controller.snapshot();
        if snapshot.phase == Phase::Finished {
            self.controller.restart_after_finish();
        } else if snapshot.running {
            self.controller.pause();
        } else {
            self.controller.start();
        }
    }

    /// Start or resume the session.
    pub fn start_session(&self) {
        self.controller.start();
    }

    /// Pause the session.
    pub fn pause_session(&self) {
        self.controller.pause();
    }

    /// Begin a fresh session after completion.
    pub fn restart_after_finish(&self) {
        self.controller.restart_after_finish();
    }

    /// Select a pattern (validated), resetting the session.
    pub fn select_pattern(&self, pattern: BreathPattern) -> Result<(), SessionError> {
        self.controller.select_pattern(pattern)
    }

    /// Select a built-in pattern by identifier.
    pub fn select_pattern_by_id(&self, id: &str) -> Result<(), SessionError> {
        let pattern = find_pattern(id).ok_or_else(|| SessionError::InvalidPattern {
            id: id.to_string(),
            reason: "unknown pattern id".to_string(),
        })?;
        self.controller.select_pattern(pattern)
    }

    /// Update the session length; refreshes the idle countdown display.
    pub fn set_session_minutes(&self, minutes: u32) {
        if let Ok(mut settings) = self.settings.write() {
            *settings = AppSettings {
                session_minutes: minutes,
                ..*settings
            }
            .normalized();
        }
        self.controller.refresh_countdown();
    }

    /// Toggle voice cues; read by the engine at each playback decision.
    pub fn set_voice_enabled(&self, enabled: bool) {
        if let Ok(mut settings) = self.settings.write() {
            settings.voice_enabled = enabled;
        }
    }

    /// Toggle the ambience loop; re-evaluates the fade state immediately.
    pub fn set_ambience_enabled(&self, enabled: bool) {
        if let Ok(mut settings) = self.settings.write() {
            settings.ambience_enabled = enabled;
        }
        self.engine.sync_ambience();
    }

    /// Release the audio output graph. The context is inert afterwards.
    pub fn dispose(&self) {
        self.controller.pause();
        self.engine.dispose();
    }
}
