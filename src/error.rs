// Error types for the breathing session core
//
// This module defines custom error types for audio and session operations,
// providing structured error handling with stable numeric codes for
// host-application reporting.

use log::error;
use std::fmt;

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling at the
/// host-application boundary.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}

/// Log an audio error with structured context
///
/// Logged fields: error_code (for programmatic handling), component, and a
/// human-readable message. Logging is non-blocking and never panics.
pub fn log_audio_error(err: &AudioError, context: &str) {
    error!(
        "Audio error in {}: code={}, component=AudioEngine, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Log a session error with structured context
pub fn log_session_error(err: &SessionError, context: &str) {
    error!(
        "Session error in {}: code={}, component=PhaseController, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Audio-related errors
///
/// These cover asset loading and output-backend operations. Note that a
/// *skipped* playback (asset absent, backend not yet unlocked) is not an
/// error anywhere in this crate; it is a silent no-op by design. Worst-case
/// degradation is silence with the timing cycle continuing correctly.
///
/// Error code range: 1001-1005
#[derive(Debug, Clone, PartialEq)]
pub enum AudioError {
    /// An asset failed to load or decode; the slot stays absent (non-fatal)
    AssetLoadFailed { asset: String, reason: String },

    /// Failed to open or start the output stream
    StreamOpenFailed { reason: String },

    /// Operation requires an activated (unlocked) output backend
    BackendInactive,

    /// The audio worker thread is gone; commands cannot be delivered
    CommandChannelClosed,

    /// Mutex was poisoned
    LockPoisoned { component: String },
}

impl ErrorCode for AudioError {
    fn code(&self) -> i32 {
        match self {
            AudioError::AssetLoadFailed { .. } => 1001,
            AudioError::StreamOpenFailed { .. } => 1002,
            AudioError::BackendInactive => 1003,
            AudioError::CommandChannelClosed => 1004,
            AudioError::LockPoisoned { .. } => 1005,
        }
    }

    fn message(&self) -> String {
        match self {
            AudioError::AssetLoadFailed { asset, reason } => {
                format!("Failed to load asset '{}': {}", asset, reason)
            }
            AudioError::StreamOpenFailed { reason } => {
                format!("Failed to open audio stream: {}", reason)
            }
            AudioError::BackendInactive => {
                "Audio backend not active. Call resume() inside a user action first.".to_string()
            }
            AudioError::CommandChannelClosed => {
                "Audio worker has shut down; command not delivered".to_string()
            }
            AudioError::LockPoisoned { component } => {
                format!("Lock poisoned for component: {}", component)
            }
        }
    }
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AudioError (code {}): {}", self.code(), self.message())
    }
}

impl std::error::Error for AudioError {}

/// Convert from std::io::Error to AudioError
impl From<std::io::Error> for AudioError {
    fn from(err: std::io::Error) -> Self {
        AudioError::StreamOpenFailed {
            reason: err.to_string(),
        }
    }
}

/// Session-related errors
///
/// Selecting a pattern that violates the positive-duration invariant is the
/// only rejection surfaced to callers; every other controller operation is
/// total.
///
/// Error code range: 2001-2002
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// Pattern has a zero inhale or exhale duration
    InvalidPattern { id: String, reason: String },

    /// Session state lock was poisoned
    StatePoisoned,
}

impl ErrorCode for SessionError {
    fn code(&self) -> i32 {
        match self {
            SessionError::InvalidPattern { .. } => 2001,
            SessionError::StatePoisoned => 2002,
        }
    }

    fn message(&self) -> String {
        match self {
            SessionError::InvalidPattern { id, reason } => {
                format!("Invalid pattern '{}': {}", id, reason)
            }
            SessionError::StatePoisoned => "Session state lock poisoned".to_string(),
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionError (code {}): {}", self.code(), self.message())
    }
}

impl std::error::Error for SessionError {}
