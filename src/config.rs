//! Configuration management for session settings and asset locations
//!
//! This module provides runtime configuration loading from JSON files so the
//! session length, cue/ambience toggles, and asset paths can be adjusted
//! without recompilation. The core treats settings as read-only input,
//! re-read at each decision point; only the surrounding application mutates
//! them.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Minimum configurable session length in minutes
pub const MIN_SESSION_MINUTES: u32 = 1;
/// Maximum configurable session length in minutes
pub const MAX_SESSION_MINUTES: u32 = 180;

/// User-facing session settings
///
/// `session_minutes` is clamped to [1, 180] by [`AppSettings::normalized`].
/// The voice and ambience flags gate cue playback and the background loop
/// independently; the finish chime ignores the voice flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Session length in minutes (1-180)
    pub session_minutes: u32,
    /// Whether phase cues (inhale/exhale/hold) are audible
    pub voice_enabled: bool,
    /// Whether the background ambience loop plays during a session
    pub ambience_enabled: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            session_minutes: 5,
            voice_enabled: true,
            ambience_enabled: true,
        }
    }
}

impl AppSettings {
    /// Clamp out-of-range values into their documented bounds.
    ///
    /// Logs a warning when a value had to be adjusted so a bad config file
    /// is visible without being fatal.
    pub fn normalized(mut self) -> Self {
        let clamped = self
            .session_minutes
            .clamp(MIN_SESSION_MINUTES, MAX_SESSION_MINUTES);
        if clamped != self.session_minutes {
            log::warn!(
                "[Config] session_minutes {} out of range [{}, {}]; clamped to {}",
                self.session_minutes,
                MIN_SESSION_MINUTES,
                MAX_SESSION_MINUTES,
                clamped
            );
            self.session_minutes = clamped;
        }
        self
    }
}

/// Locations of the five sound assets, one per cue name.
///
/// Supplied at audio engine construction. A missing file is logged at load
/// time and leaves that asset absent; playback of an absent asset is a
/// silent no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPaths {
    pub inhale: PathBuf,
    pub exhale: PathBuf,
    pub hold: PathBuf,
    pub finish: PathBuf,
    pub ambience: PathBuf,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            inhale: PathBuf::from("assets/audio/inhale.wav"),
            exhale: PathBuf::from("assets/audio/exhale.wav"),
            hold: PathBuf::from("assets/audio/hold.wav"),
            finish: PathBuf::from("assets/audio/finish.wav"),
            ambience: PathBuf::from("assets/audio/ambience.wav"),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub settings: AppSettings,
    #[serde(default)]
    pub assets: AssetPaths,
}

impl AppConfig {
    /// Load configuration from a JSON file.
    ///
    /// Falls back to defaults (with a logged warning) if the file is missing
    /// or unparseable; settings are normalized either way.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        let config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<AppConfig>(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        };

        Self {
            settings: config.settings.normalized(),
            assets: config.assets,
        }
    }

    /// Load configuration from the default location.
    pub fn load() -> Self {
        Self::load_from_file("assets/breath_config.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = AppSettings::default();
        assert_eq!(settings.session_minutes, 5);
        assert!(settings.voice_enabled);
        assert!(settings.ambience_enabled);
    }

    #[test]
    fn test_normalized_clamps_low_and_high() {
        let low = AppSettings {
            session_minutes: 0,
            ..Default::default()
        }
        .normalized();
        assert_eq!(low.session_minutes, MIN_SESSION_MINUTES);

        let high = AppSettings {
            session_minutes: 500,
            ..Default::default()
        }
        .normalized();
        assert_eq!(high.session_minutes, MAX_SESSION_MINUTES);
    }

    #[test]
    fn test_normalized_keeps_in_range_value() {
        let settings = AppSettings {
            session_minutes: 20,
            ..Default::default()
        }
        .normalized();
        assert_eq!(settings.session_minutes, 20);
    }

    #[test]
    fn test_default_asset_paths() {
        let assets = AssetPaths::default();
        assert!(assets.inhale.ends_with("inhale.wav"));
        assert!(assets.ambience.ends_with("ambience.wav"));
    }

    #[test]
    fn test_json_roundtrip() {
        let config = AppConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, config);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = AppConfig::load_from_file("/nonexistent/breath_config.json");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: AppConfig =
            serde_json::from_str(r#"{"settings":{"session_minutes":10,"voice_enabled":false,"ambience_enabled":true}}"#)
                .unwrap();
        assert_eq!(parsed.settings.session_minutes, 10);
        assert!(!parsed.settings.voice_enabled);
        assert_eq!(parsed.assets, AssetPaths::default());
    }
}
