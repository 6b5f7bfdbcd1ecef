//! PhaseController - the session's finite-state machine
//!
//! Advances through breathing phases on deferred timers and counts the
//! session down once per second. The timer discipline is schedule-cancel:
//! every phase entry bumps an epoch and owns at most one outstanding
//! transition task carrying that epoch; pausing, selecting a pattern, and
//! the forced finish all bump the epoch, so a stale timer can never fire
//! after the state it was scheduled for is superseded.
//!
//! Countdown expiry forces an immediate, unconditional transition to
//! `Finished`, preempting whatever breathing transition was pending.
//!
//! Observers get two views: a synchronous [`SessionObserver`] invoked on
//! each phase entry *before* the broadcast event is observable (so cue
//! intent always precedes the visual notification), and a tokio broadcast
//! stream of [`SessionEvent`]s for display layers.

use std::sync::{Arc, Mutex, RwLock, Weak};
use std::time::Duration;

use tokio::sync::broadcast;

use crate::config::AppSettings;
use crate::error::SessionError;
use crate::patterns::{default_pattern, BreathPattern};
use crate::session::phase::{next_phase, phase_duration, Phase};
use crate::timing::{secs_to_duration, session_seconds};

/// Buffer size of the session event broadcast channel. Sized so a slow
/// subscriber can catch up on several minutes of ticks without lagging.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Events published to display-layer subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    PhaseChanged { phase: Phase },
    CountdownTick { remaining_secs: u32 },
}

/// Read-only view of the session state for display.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub pattern: BreathPattern,
    pub phase: Phase,
    pub remaining_secs: u32,
    pub running: bool,
}

/// Synchronous observer seam for the audio layer.
///
/// `phase_entered` runs on every phase entry before the corresponding
/// `PhaseChanged` event is sent, so the cue for a phase is requested no
/// later than the visual notification becomes observable.
pub trait SessionObserver: Send + Sync {
    fn phase_entered(&self, phase: Phase);
    fn running_changed(&self, running: bool);
}

/// Observer that ignores everything; for event-stream-only consumers.
pub struct NullObserver;

impl SessionObserver for NullObserver {
    fn phase_entered(&self, _phase: Phase) {}
    fn running_changed(&self, _running: bool) {}
}

struct SessionState {
    pattern: BreathPattern,
    phase: Phase,
    remaining_secs: u32,
    running: bool,
    /// Cancellation token for the pending phase transition
    phase_epoch: u64,
    /// Cancellation token for the countdown ticker
    ticker_epoch: u64,
}

struct ControllerInner {
    state: Mutex<SessionState>,
    settings: Arc<RwLock<AppSettings>>,
    observer: Arc<dyn SessionObserver>,
    events: broadcast::Sender<SessionEvent>,
    /// Self-handle for the timer tasks this controller spawns.
    weak: Weak<ControllerInner>,
}

/// The phase-timing state machine. Cheap to clone via its inner Arc; all
/// operations take `&self` and are safe to call from any task.
pub struct PhaseController {
    inner: Arc<ControllerInner>,
}

impl PhaseController {
    /// Create a controller on the default pattern, countdown primed from
    /// the configured session length.
    pub fn new(settings: Arc<RwLock<AppSettings>>, observer: Arc<dyn SessionObserver>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let minutes = settings
            .read()
            .map(|s| s.session_minutes)
            .unwrap_or_else(|_| AppSettings::default().session_minutes);

        Self {
            inner: Arc::new_cyclic(|weak| ControllerInner {
                state: Mutex::new(SessionState {
                    pattern: default_pattern(),
                    phase: Phase::Idle,
                    remaining_secs: session_seconds(minutes),
                    running: false,
                    phase_epoch: 0,
                    ticker_epoch: 0,
                }),
                settings,
                observer,
                events,
                weak: weak.clone(),
            }),
        }
    }

    /// Subscribe to session events. Subscribe before starting to observe
    /// the first phase change.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Current session state for display.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.snapshot()
    }

    /// Start or resume the cycle.
    ///
    /// From `Idle` this immediately enters `Inhale`. Resuming after a pause
    /// restarts the current phase's timer from its full duration; elapsed
    /// time within the interrupted phase is not preserved. No-op while
    /// already running or after the session finished (use
    /// [`restart_after_finish`] for the latter).
    ///
    /// [`restart_after_finish`]: PhaseController::restart_after_finish
    pub fn start(&self) {
        self.inner.start();
    }

    /// Pause the cycle: cancels the pending transition and resets the
    /// phase to `Idle` (unless already finished).
    pub fn pause(&self) {
        self.inner.pause();
    }

    /// Replace the active pattern, stopping the session and resetting the
    /// countdown. Rejects patterns with a zero inhale or exhale.
    pub fn select_pattern(&self, pattern: BreathPattern) -> Result<(), SessionError> {
        self.inner.select_pattern(pattern)
    }

    /// Begin a fresh session after `Finished`; logged no-op from any other
    /// phase.
    pub fn restart_after_finish(&self) {
        self.inner.restart_after_finish();
    }

    /// Re-read the configured session length into the countdown. Applies
    /// only while idle and not running (the display refresh when the user
    /// edits the session length between sessions).
    pub fn refresh_countdown(&self) {
        self.inner.refresh_countdown();
    }
}

impl Clone for PhaseController {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl ControllerInner {
    fn snapshot(&self) -> SessionSnapshot {
        match self.state.lock() {
            Ok(state) => SessionSnapshot {
                pattern: state.pattern.clone(),
                phase: state.phase,
                remaining_secs: state.remaining_secs,
                running: state.running,
            },
            Err(_) => SessionSnapshot {
                pattern: default_pattern(),
                phase: Phase::Idle,
                remaining_secs: 0,
                running: false,
            },
        }
    }

    fn session_minutes(&self) -> u32 {
        self.settings
            .read()
            .map(|s| s.session_minutes)
            .unwrap_or_else(|_| AppSettings::default().session_minutes)
    }

    fn start(&self) {
        let entry;
        let ticker_epoch;
        {
            let Ok(mut state) = self.state.lock() else {
                log::warn!("[Session] State lock poisoned in start");
                return;
            };
            if state.running {
                log::debug!("[Session] start ignored: already running");
                return;
            }
            if state.phase == Phase::Finished {
                log::warn!("[Session] start ignored: session finished; call restart_after_finish");
                return;
            }
            state.running = true;
            state.ticker_epoch += 1;
            ticker_epoch = state.ticker_epoch;
            // Resuming restarts the interrupted phase from its full
            // duration; from idle the cycle kicks off with an inhale.
            entry = match state.phase {
                Phase::Idle => Phase::Inhale,
                other => other,
            };
        }

        self.observer.running_changed(true);
        self.spawn_ticker(ticker_epoch);
        self.enter_phase(entry, None);
    }

    fn pause(&self) {
        {
            let Ok(mut state) = self.state.lock() else {
                log::warn!("[Session] State lock poisoned in pause");
                return;
            };
            if !state.running {
                return;
            }
            state.running = false;
            state.phase_epoch += 1;
            state.ticker_epoch += 1;
            if state.phase != Phase::Finished {
                state.phase = Phase::Idle;
            }
        }

        self.observer.running_changed(false);
        self.observer.phase_entered(Phase::Idle);
        let _ = self.events.send(SessionEvent::PhaseChanged { phase: Phase::Idle });
    }

    fn select_pattern(&self, pattern: BreathPattern) -> Result<(), SessionError> {
        pattern.validate()?;

        let remaining = session_seconds(self.session_minutes());
        {
            let mut state = self.state.lock().map_err(|_| SessionError::StatePoisoned)?;
            state.pattern = pattern;
            state.phase = Phase::Idle;
            state.running = false;
            state.remaining_secs = remaining;
            state.phase_epoch += 1;
            state.ticker_epoch += 1;
        }

        self.observer.running_changed(false);
        let _ = self.events.send(SessionEvent::PhaseChanged { phase: Phase::Idle });
        let _ = self.events.send(SessionEvent::CountdownTick {
            remaining_secs: remaining,
        });
        Ok(())
    }

    fn restart_after_finish(&self) {
        {
            let Ok(mut state) = self.state.lock() else {
                log::warn!("[Session] State lock poisoned in restart_after_finish");
                return;
            };
            if state.phase != Phase::Finished {
                log::warn!(
                    "[Session] restart_after_finish ignored: phase is {}, not finished",
                    state.phase.label()
                );
                return;
            }
            state.phase = Phase::Idle;
            state.remaining_secs = session_seconds(self.session_minutes());
        }
        self.start();
    }

    fn refresh_countdown(&self) {
        let remaining = session_seconds(self.session_minutes());
        {
            let Ok(mut state) = self.state.lock() else {
                return;
            };
            if state.running || state.phase != Phase::Idle {
                return;
            }
            state.remaining_secs = remaining;
        }
        let _ = self.events.send(SessionEvent::CountdownTick {
            remaining_secs: remaining,
        });
    }

    /// Enter a phase, emit cue intent and the phase event, and schedule the
    /// single outstanding transition for it.
    ///
    /// `required_epoch` carries a transition timer's token: entry is
    /// abandoned when the token is stale or the session stopped running,
    /// which is exactly the cancel semantics pausing relies on.
    fn enter_phase(&self, phase: Phase, required_epoch: Option<u64>) {
        let epoch;
        let duration_secs;
        let next;
        {
            let Ok(mut state) = self.state.lock() else {
                log::warn!("[Session] State lock poisoned in enter_phase");
                return;
            };
            if let Some(required) = required_epoch {
                if state.phase_epoch != required {
                    return;
                }
            }
            if !state.running {
                return;
            }
            state.phase = phase;
            state.phase_epoch += 1;
            epoch = state.phase_epoch;
            duration_secs = phase_duration(&state.pattern, phase);
            next = next_phase(&state.pattern, phase);
        }

        log::debug!(
            "[Session] Entered phase {} ({}s)",
            phase.label(),
            duration_secs
        );

        // Cue intent first, then the observable notification.
        self.observer.phase_entered(phase);
        let _ = self.events.send(SessionEvent::PhaseChanged { phase });

        if let Some(next) = next {
            if duration_secs > 0.0 {
                self.spawn_transition(epoch, duration_secs, next);
            }
        }
    }

    /// Schedule the one outstanding transition for the current phase entry.
    fn spawn_transition(&self, epoch: u64, duration_secs: f32, next: Phase) {
        let Some(inner) = self.weak.upgrade() else {
            return;
        };
        tokio::spawn(async move {
            tokio::time::sleep(secs_to_duration(duration_secs)).await;
            inner.enter_phase(next, Some(epoch));
        });
    }

    /// Decrement the countdown once per second while running; expiry forces
    /// the finish, preempting any pending breathing transition.
    fn spawn_ticker(&self, epoch: u64) {
        let Some(inner) = self.weak.upgrade() else {
            return;
        };
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(1)).await;
                let remaining = {
                    let Ok(mut state) = inner.state.lock() else {
                        return;
                    };
                    if state.ticker_epoch != epoch || !state.running {
                        return;
                    }
                    state.remaining_secs = state.remaining_secs.saturating_sub(1);
                    state.remaining_secs
                };

                let _ = inner.events.send(SessionEvent::CountdownTick {
                    remaining_secs: remaining,
                });
                if remaining == 0 {
                    inner.force_finish();
                    return;
                }
            }
        });
    }

    /// Unconditional transition to `Finished`, canceling pending work.
    fn force_finish(&self) {
        {
            let Ok(mut state) = self.state.lock() else {
                return;
            };
            if state.phase == Phase::Finished {
                return;
            }
            state.running = false;
            state.phase = Phase::Finished;
            state.phase_epoch += 1;
            state.ticker_epoch += 1;
        }

        log::info!("[Session] Countdown expired; session finished");

        // The finish chime fires regardless of the running flag, and both
        // audio intents precede the visual notification.
        self.observer.phase_entered(Phase::Finished);
        self.observer.running_changed(false);
        let _ = self.events.send(SessionEvent::PhaseChanged {
            phase: Phase::Finished,
        });
    }
}
