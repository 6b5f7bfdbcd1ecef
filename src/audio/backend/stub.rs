//! Recording stub backend for tests and headless runs.
//!
//! Maintains the same activation contract as the cpal backend but records
//! every submitted command instead of rendering audio, so tests can assert
//! on the engine's output without a device.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::audio::mixer::MixerCommand;
use crate::error::AudioError;

use super::{AudioBackend, ENGINE_SAMPLE_RATE};

/// Backend that records commands rather than playing them.
pub struct StubBackend {
    active: AtomicBool,
    commands: Mutex<Vec<MixerCommand>>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
            commands: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of every command submitted so far.
    pub fn commands(&self) -> Vec<MixerCommand> {
        self.commands.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Drain recorded commands, leaving the log empty.
    pub fn take_commands(&self) -> Vec<MixerCommand> {
        self.commands
            .lock()
            .map(|mut g| std::mem::take(&mut *g))
            .unwrap_or_default()
    }

    /// Count of loop-start commands seen (ambience instances requested).
    pub fn loop_starts(&self) -> usize {
        self.commands()
            .iter()
            .filter(|c| matches!(c, MixerCommand::StartLoop { .. }))
            .count()
    }

    /// Count of one-shot voice commands seen.
    pub fn voice_plays(&self) -> usize {
        self.commands()
            .iter()
            .filter(|c| matches!(c, MixerCommand::PlayVoice { .. }))
            .count()
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for StubBackend {
    fn activate(&self) -> Result<(), AudioError> {
        self.active.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn submit(&self, cmd: MixerCommand) -> Result<(), AudioError> {
        if !self.is_active() {
            return Err(AudioError::BackendInactive);
        }
        self.commands
            .lock()
            .map_err(|_| AudioError::LockPoisoned {
                component: "stub_backend".to_string(),
            })?
            .push(cmd);
        Ok(())
    }

    fn sample_rate(&self) -> u32 {
        ENGINE_SAMPLE_RATE
    }

    fn close(&self) -> Result<(), AudioError> {
        self.active.store(false, Ordering::SeqCst);
        Ok(())
    }
}
