//! Asset registry and background WAV loading
//!
//! The five sounds are decoded independently on blocking tasks at engine
//! construction. A failed load is logged and leaves that slot absent -
//! it never aborts the other loads, and playback of an absent asset is a
//! silent no-op. Decoded audio is downmixed to mono f32 and resampled to
//! the engine rate so the mixer never touches format conversion.

use std::path::Path;
use std::sync::{Arc, RwLock};

use crate::audio::backend::ENGINE_SAMPLE_RATE;
use crate::audio::cue::SoundAsset;
use crate::config::AssetPaths;
use crate::error::{log_audio_error, AudioError};

/// Fixed enum-indexed registry of decoded, ready-to-play sample buffers.
///
/// Slots start absent and are populated as loads complete; lookups never
/// block on loading.
pub struct AssetStore {
    slots: RwLock<[Option<Arc<Vec<f32>>>; SoundAsset::ALL.len()]>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self {
            slots: RwLock::new([None, None, None, None, None]),
        }
    }

    /// Store decoded samples for an asset (loader and test seam).
    pub fn insert(&self, asset: SoundAsset, samples: Vec<f32>) {
        if let Ok(mut slots) = self.slots.write() {
            slots[asset.index()] = Some(Arc::new(samples));
        }
    }

    /// Fetch an asset's samples if its load has completed.
    pub fn get(&self, asset: SoundAsset) -> Option<Arc<Vec<f32>>> {
        self.slots
            .read()
            .ok()
            .and_then(|slots| slots[asset.index()].clone())
    }

    /// Whether the asset is present.
    pub fn is_loaded(&self, asset: SoundAsset) -> bool {
        self.slots
            .read()
            .map(|slots| slots[asset.index()].is_some())
            .unwrap_or(false)
    }
}

impl Default for AssetStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Kick off one independent blocking load per asset.
///
/// Must be called from within a tokio runtime. Each load decodes and
/// resamples off the async threads; completion order is arbitrary.
pub fn spawn_asset_loads(store: Arc<AssetStore>, paths: AssetPaths) {
    for asset in SoundAsset::ALL {
        let path = asset.path(&paths).to_path_buf();
        let store = Arc::clone(&store);
        tokio::task::spawn_blocking(move || match load_wav(&path) {
            Ok(samples) => {
                log::info!(
                    "[Audio] Loaded asset '{}' ({} frames)",
                    asset.label(),
                    samples.len()
                );
                store.insert(asset, samples);
            }
            Err(err) => {
                // Non-fatal: the slot stays absent and playback skips it.
                log_audio_error(&err, "load_asset");
            }
        });
    }
}

/// Decode a WAV file to mono f32 at the engine sample rate.
pub fn load_wav(path: &Path) -> Result<Vec<f32>, AudioError> {
    let asset_name = path.display().to_string();
    let load_err = |reason: String| AudioError::AssetLoadFailed {
        asset: asset_name.clone(),
        reason,
    };

    let mut reader = hound::WavReader::open(path).map_err(|e| load_err(e.to_string()))?;
    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(load_err("zero channels".to_string()));
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| load_err(e.to_string()))?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .map_err(|e| load_err(e.to_string()))?
        }
    };

    let mono = downmix(&interleaved, channels);
    Ok(resample_linear(&mono, spec.sample_rate, ENGINE_SAMPLE_RATE))
}

/// Average interleaved channels down to mono.
fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels == 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

/// Linear-interpolation resampler; identity when rates match.
fn resample_linear(input: &[f32], src_rate: u32, dst_rate: u32) -> Vec<f32> {
    if src_rate == dst_rate || input.is_empty() {
        return input.to_vec();
    }
    let ratio = src_rate as f64 / dst_rate as f64;
    let out_len = (input.len() as f64 / ratio).round() as usize;
    let last = input.len() - 1;

    (0..out_len)
        .map(|i| {
            let pos = i as f64 * ratio;
            let idx = (pos as usize).min(last);
            let frac = (pos - idx as f64) as f32;
            let a = input[idx];
            let b = input[(idx + 1).min(last)];
            a + (b - a) * frac
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_wav_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("breath_coach_{}_{}.wav", name, std::process::id()))
    }

    fn write_test_wav(path: &Path, spec: hound::WavSpec, frames: usize) {
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..frames {
            for _ in 0..spec.channels {
                writer.write_sample((i as i32 % 100) * 100).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_store_starts_empty() {
        let store = AssetStore::new();
        for asset in SoundAsset::ALL {
            assert!(!store.is_loaded(asset));
            assert!(store.get(asset).is_none());
        }
    }

    #[test]
    fn test_insert_and_get() {
        let store = AssetStore::new();
        store.insert(SoundAsset::Finish, vec![0.1, 0.2]);

        assert!(store.is_loaded(SoundAsset::Finish));
        assert!(!store.is_loaded(SoundAsset::Inhale));
        assert_eq!(store.get(SoundAsset::Finish).unwrap().len(), 2);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let err = load_wav(Path::new("/nonexistent/cue.wav")).unwrap_err();
        assert!(matches!(err, AudioError::AssetLoadFailed { .. }));
    }

    #[test]
    fn test_load_wav_stereo_downmix_and_resample() {
        let path = temp_wav_path("stereo");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        write_test_wav(&path, spec, 4410);

        let samples = load_wav(&path).unwrap();
        std::fs::remove_file(&path).ok();

        // 4410 frames at 44.1k resample to ~4800 at 48k.
        let expected = (4410.0 * ENGINE_SAMPLE_RATE as f64 / 44100.0).round() as usize;
        assert_eq!(samples.len(), expected);
        assert!(samples.iter().all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn test_load_wav_mono_at_engine_rate_is_identity_length() {
        let path = temp_wav_path("mono48k");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: ENGINE_SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        write_test_wav(&path, spec, 480);

        let samples = load_wav(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(samples.len(), 480);
    }

    #[test]
    fn test_downmix_averages_channels() {
        let mono = downmix(&[1.0, 0.0, 0.5, 0.5], 2);
        assert_eq!(mono, vec![0.5, 0.5]);
    }

    #[test]
    fn test_resample_identity() {
        let input = vec![0.0, 0.5, 1.0];
        assert_eq!(resample_linear(&input, 48000, 48000), input);
    }

    #[test]
    fn test_resample_doubles_length() {
        let input = vec![0.0, 1.0];
        let out = resample_linear(&input, 24000, 48000);
        assert_eq!(out.len(), 4);
        assert_eq!(out[0], 0.0);
        // Interpolated midpoint.
        assert!((out[1] - 0.5).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_spawn_asset_loads_missing_files_leave_slots_absent() {
        let store = Arc::new(AssetStore::new());
        let paths = AssetPaths {
            inhale: PathBuf::from("/nonexistent/inhale.wav"),
            exhale: PathBuf::from("/nonexistent/exhale.wav"),
            hold: PathBuf::from("/nonexistent/hold.wav"),
            finish: PathBuf::from("/nonexistent/finish.wav"),
            ambience: PathBuf::from("/nonexistent/ambience.wav"),
        };
        spawn_asset_loads(Arc::clone(&store), paths);

        // Give the blocking tasks a moment to fail.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        for asset in SoundAsset::ALL {
            assert!(!store.is_loaded(asset));
        }
    }
}
