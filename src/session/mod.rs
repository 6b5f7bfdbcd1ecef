// Session module - phase state machine and session timing

pub mod controller;
pub mod phase;

// Re-export commonly used types for convenience
pub use controller::{
    NullObserver, PhaseController, SessionEvent, SessionObserver, SessionSnapshot,
};
pub use phase::{next_phase, phase_duration, Phase};
