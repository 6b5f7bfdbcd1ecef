//! Output backend abstractions for the audio engine.

use crate::audio::mixer::MixerCommand;
use crate::error::AudioError;

/// Fixed engine sample rate in Hz; assets are resampled to this at load
/// time and the output stream is opened at this rate.
pub const ENGINE_SAMPLE_RATE: u32 = 48000;

/// Trait implemented by platform audio backends.
///
/// A backend owns the process-wide output graph. It starts suspended;
/// `activate` opens and starts the stream (the unlock step) and is
/// idempotent. `submit` hands a command to the real-time mixer without
/// blocking. `close` releases the device; after closing, the backend can be
/// activated again.
pub trait AudioBackend: Send + Sync {
    fn activate(&self) -> Result<(), AudioError>;
    fn is_active(&self) -> bool;
    fn submit(&self, cmd: MixerCommand) -> Result<(), AudioError>;
    fn sample_rate(&self) -> u32;
    fn close(&self) -> Result<(), AudioError>;
}

mod cpal;
pub use cpal::CpalBackend;

mod stub;
pub use stub::StubBackend;
