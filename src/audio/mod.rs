// Audio module - asset loading, mixing, and the gated output engine

pub mod assets;
pub mod backend;
pub mod cue;
pub mod engine;
pub mod mixer;
pub mod tone;

// Re-export commonly used types for convenience
pub use assets::AssetStore;
pub use backend::{AudioBackend, CpalBackend, StubBackend, ENGINE_SAMPLE_RATE};
pub use cue::{CueKind, SoundAsset};
pub use engine::{AmbienceState, AudioEngine};
pub use mixer::{Mixer, MixerCommand};
